use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use tokio::time::timeout;

use crate::mock::{FailingDownloader, MockDownloader};
use crate::{Engine, EngineConfig, Handler};

fn quick_config(workers: usize) -> EngineConfig {
    EngineConfig::default()
        .with_workers(workers)
        .with_delay(Duration::ZERO)
        .with_randomize_user_agent(false)
}

async fn settle(engine: &Engine) {
    let give_up = tokio::time::Instant::now() + Duration::from_secs(5);
    while engine.pending() > 0 {
        assert!(
            tokio::time::Instant::now() < give_up,
            "crawl did not settle"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

async fn stop(engine: &mut Engine) {
    engine.shutdown();
    timeout(Duration::from_secs(1), engine.wait())
        .await
        .expect("workers did not exit");
}

#[tokio::test]
async fn test_tasks_route_only_to_their_own_handler() {
    let mut mock = MockDownloader::new();
    mock.add_page("https://example.com/a", "<html><body>a</body></html>");
    mock.add_page("https://example.com/b", "<html><body>b</body></html>");

    let a_requests = Arc::new(AtomicUsize::new(0));
    let a_documents = Arc::new(AtomicUsize::new(0));
    let b_requests = Arc::new(AtomicUsize::new(0));
    let b_documents = Arc::new(AtomicUsize::new(0));

    let handler_a = {
        let requests = Arc::clone(&a_requests);
        let documents = Arc::clone(&a_documents);
        Handler::new("a")
            .on_request(move |_| {
                requests.fetch_add(1, Ordering::SeqCst);
            })
            .on_html(move |_, _, _| {
                documents.fetch_add(1, Ordering::SeqCst);
            })
    };
    let handler_b = {
        let requests = Arc::clone(&b_requests);
        let documents = Arc::clone(&b_documents);
        Handler::new("b")
            .on_request(move |_| {
                requests.fetch_add(1, Ordering::SeqCst);
            })
            .on_html(move |_, _, _| {
                documents.fetch_add(1, Ordering::SeqCst);
            })
    };

    let mut builder = Engine::builder(quick_config(2));
    builder.with_downloader(Arc::new(mock));
    let ref_a = builder.register(handler_a);
    let ref_b = builder.register(handler_b);

    ref_a.submit("https://example.com/a").unwrap();
    ref_b.submit("https://example.com/b").unwrap();

    let mut engine = builder.build().unwrap();
    engine.run();
    settle(&engine).await;
    stop(&mut engine).await;

    assert_eq!(a_requests.load(Ordering::SeqCst), 1);
    assert_eq!(a_documents.load(Ordering::SeqCst), 1);
    assert_eq!(b_requests.load(Ordering::SeqCst), 1);
    assert_eq!(b_documents.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_lower_priority_value_pops_first_across_handlers() {
    let order = Arc::new(Mutex::new(Vec::new()));

    let urgent = {
        let order = Arc::clone(&order);
        Handler::new("urgent").with_priority(0).on_request(move |request| {
            order.lock().unwrap().push(request.url.path().to_string());
        })
    };
    let casual = {
        let order = Arc::clone(&order);
        Handler::new("casual").with_priority(3).on_request(move |request| {
            order.lock().unwrap().push(request.url.path().to_string());
        })
    };

    let mut builder = Engine::builder(quick_config(1));
    builder.with_downloader(Arc::new(MockDownloader::new()));
    let urgent_ref = builder.register(urgent);
    let casual_ref = builder.register(casual);

    // Submission order is the reverse of priority order.
    casual_ref.submit("https://example.com/casual").unwrap();
    urgent_ref.submit("https://example.com/urgent").unwrap();

    let mut engine = builder.build().unwrap();
    engine.run();
    settle(&engine).await;
    stop(&mut engine).await;

    assert_eq!(*order.lock().unwrap(), vec!["/urgent", "/casual"]);
}

#[tokio::test]
async fn test_fetch_failure_runs_error_callbacks_and_spares_the_worker() {
    let mut mock = MockDownloader::new();
    mock.add_failure("https://example.com/down", "connection refused");
    mock.add_page("https://example.com/up", "<html><body>up</body></html>");

    let errors = Arc::new(Mutex::new(Vec::new()));
    let documents = Arc::new(AtomicUsize::new(0));

    let handler = {
        let errors = Arc::clone(&errors);
        let documents = Arc::clone(&documents);
        Handler::new("mixed")
            .on_error(move |response, error| {
                errors
                    .lock()
                    .unwrap()
                    .push((error.is_fetch(), response.is_some()));
            })
            .on_html(move |_, _, _| {
                documents.fetch_add(1, Ordering::SeqCst);
            })
    };

    let mut builder = Engine::builder(quick_config(1));
    builder.with_downloader(Arc::new(mock));
    let handler_ref = builder.register(handler);

    // The failing task goes first so the same worker must survive it to
    // reach the healthy one.
    handler_ref
        .submit_with_priority("https://example.com/down", 0)
        .unwrap();
    handler_ref
        .submit_with_priority("https://example.com/up", 1)
        .unwrap();

    let mut engine = builder.build().unwrap();
    engine.run();
    settle(&engine).await;
    stop(&mut engine).await;

    assert_eq!(*errors.lock().unwrap(), vec![(true, false)]);
    assert_eq!(documents.load(Ordering::SeqCst), 1);

    let stats = engine.stats();
    assert_eq!(stats.fetch_errors, 1);
    assert_eq!(stats.pages_fetched, 1);
    assert_eq!(stats.tasks_completed, 2);
}

#[tokio::test]
async fn test_every_fetch_failing_still_drains_the_queue() {
    let errors = Arc::new(AtomicUsize::new(0));

    let handler = {
        let errors = Arc::clone(&errors);
        Handler::new("doomed").on_error(move |_, _| {
            errors.fetch_add(1, Ordering::SeqCst);
        })
    };

    let mut builder = Engine::builder(quick_config(2));
    builder.with_downloader(Arc::new(FailingDownloader));
    let handler_ref = builder.register(handler);

    for i in 0..6 {
        handler_ref
            .submit(format!("https://example.com/{}", i))
            .unwrap();
    }

    let mut engine = builder.build().unwrap();
    engine.run();
    settle(&engine).await;
    stop(&mut engine).await;

    assert_eq!(errors.load(Ordering::SeqCst), 6);

    let stats = engine.stats();
    assert_eq!(stats.fetch_errors, 6);
    assert_eq!(stats.tasks_completed, 6);
    assert_eq!(stats.pages_fetched, 0);
}

#[tokio::test]
async fn test_parse_failure_is_reported_distinctly_with_its_response() {
    let mut mock = MockDownloader::new();
    // A fetch that succeeds but whose body is not text at all.
    mock.add_page("https://example.com/binary", vec![0xff, 0xfe, 0x00, 0x80]);

    let errors = Arc::new(Mutex::new(Vec::new()));

    let handler = {
        let errors = Arc::clone(&errors);
        Handler::new("binary").on_error(move |response, error| {
            errors.lock().unwrap().push((
                error.is_parse(),
                error.is_fetch(),
                response.map(|r| r.status),
            ));
        })
    };

    let mut builder = Engine::builder(quick_config(1));
    builder.with_downloader(Arc::new(mock));
    let handler_ref = builder.register(handler);
    handler_ref.submit("https://example.com/binary").unwrap();

    let mut engine = builder.build().unwrap();
    engine.run();
    settle(&engine).await;
    stop(&mut engine).await;

    // Distinguishable from a fetch failure, and the response that did
    // arrive is handed over alongside the error.
    assert_eq!(*errors.lock().unwrap(), vec![(true, false, Some(200))]);

    let stats = engine.stats();
    assert_eq!(stats.parse_errors, 1);
    assert_eq!(stats.pages_fetched, 1);
    assert_eq!(stats.fetch_errors, 0);
}

#[tokio::test]
async fn test_html_callbacks_submit_recursively() {
    let mut mock = MockDownloader::new();
    mock.add_page(
        "https://example.com/page/1",
        r#"<html><body><a class="next" href="/page/2">next</a></body></html>"#,
    );
    mock.add_page(
        "https://example.com/page/2",
        r#"<html><body><a class="next" href="/page/3">next</a></body></html>"#,
    );
    mock.add_page(
        "https://example.com/page/3",
        "<html><body>the end</body></html>",
    );

    let visited = Arc::new(Mutex::new(Vec::new()));

    // The handler feeds itself, so its callback needs the submission
    // handle that only exists once registration returns.
    let slot: Arc<OnceLock<crate::HandlerRef>> = Arc::new(OnceLock::new());
    let handler = {
        let visited = Arc::clone(&visited);
        let slot = Arc::clone(&slot);
        Handler::new("pager").on_html(move |_, response, document| {
            visited.lock().unwrap().push(response.url.to_string());
            for link in document.select("a.next").unwrap() {
                let next = response.url.join(link.attr("href").unwrap()).unwrap();
                slot.get().unwrap().submit(next.as_str()).unwrap();
            }
        })
    };

    let mut builder = Engine::builder(quick_config(2));
    builder.with_downloader(Arc::new(mock));
    let pager_ref = builder.register(handler);
    let _ = slot.set(pager_ref.clone());
    pager_ref.submit("https://example.com/page/1").unwrap();

    let mut engine = builder.build().unwrap();
    engine.run();
    settle(&engine).await;
    stop(&mut engine).await;

    let stats = engine.stats();
    assert_eq!(stats.tasks_submitted, 3);
    assert_eq!(stats.tasks_completed, 3);
    assert_eq!(visited.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_non_success_status_is_still_parsed_and_dispatched() {
    let mut mock = MockDownloader::new();
    mock.add_response(
        "https://example.com/gone",
        404,
        "<html><body><p>not here</p></body></html>",
    );

    let statuses = Arc::new(Mutex::new(Vec::new()));
    let paragraphs = Arc::new(Mutex::new(Vec::new()));

    let handler = {
        let statuses = Arc::clone(&statuses);
        let paragraphs = Arc::clone(&paragraphs);
        Handler::new("archive")
            .on_response(move |response| {
                statuses.lock().unwrap().push(response.status);
            })
            .on_html(move |_, _, document| {
                for p in document.select("p").unwrap() {
                    paragraphs.lock().unwrap().push(p.text());
                }
            })
    };

    let mut builder = Engine::builder(quick_config(1));
    builder.with_downloader(Arc::new(mock));
    let handler_ref = builder.register(handler);
    handler_ref.submit("https://example.com/gone").unwrap();

    let mut engine = builder.build().unwrap();
    engine.run();
    settle(&engine).await;
    stop(&mut engine).await;

    // Status is the caller's business; the pipeline parses whatever the
    // transport returned.
    assert_eq!(*statuses.lock().unwrap(), vec![404]);
    assert_eq!(*paragraphs.lock().unwrap(), vec!["not here"]);
}

#[tokio::test]
async fn test_request_callback_mutations_reach_the_transport() {
    let mock = Arc::new(MockDownloader::new());

    let handler = Handler::new("tagged").on_request(|request| {
        request.headers.insert("X-Probe".into(), "1".into());
    });

    let mut builder = Engine::builder(quick_config(1));
    builder.with_downloader(mock.clone());
    let handler_ref = builder.register(handler);
    handler_ref.submit("https://example.com/").unwrap();

    let mut engine = builder.build().unwrap();
    engine.run();
    settle(&engine).await;
    stop(&mut engine).await;

    let seen = mock.requests();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].headers.get("X-Probe").unwrap(), "1");
}

#[tokio::test]
async fn test_user_agent_randomization_is_applied_before_dispatch() {
    let mock = Arc::new(MockDownloader::new());

    let config = EngineConfig::default()
        .with_workers(1)
        .with_delay(Duration::ZERO)
        .with_randomize_user_agent(true);

    let mut builder = Engine::builder(config);
    builder.with_downloader(mock.clone());
    let handler_ref = builder.register(Handler::new("anon"));
    handler_ref.submit("https://example.com/").unwrap();

    let mut engine = builder.build().unwrap();
    engine.run();
    settle(&engine).await;
    stop(&mut engine).await;

    let seen = mock.requests();
    assert_eq!(seen.len(), 1);
    let agent = seen[0].headers.get("User-Agent").expect("no User-Agent set");
    assert!(agent.starts_with("Mozilla/5.0"));
}

#[tokio::test]
async fn test_user_agent_left_alone_when_randomization_is_off() {
    let mock = Arc::new(MockDownloader::new());

    let mut builder = Engine::builder(quick_config(1));
    builder.with_downloader(mock.clone());
    let handler_ref = builder.register(Handler::new("plain"));
    handler_ref.submit("https://example.com/").unwrap();

    let mut engine = builder.build().unwrap();
    engine.run();
    settle(&engine).await;
    stop(&mut engine).await;

    let seen = mock.requests();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].headers.get("User-Agent").is_none());
}
