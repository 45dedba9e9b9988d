//! The worker loop: pop, fetch, parse, dispatch.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, warn};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use spindle_core::task::Task;
use spindle_downloader::{random_user_agent, Downloader};
use spindle_html::Document;
use spindle_queue::TaskQueue;

use crate::handler::HandlerRegistry;
use crate::stats::CrawlStats;

/// State shared by every worker of one engine
pub(crate) struct WorkerContext {
    pub(crate) queue: Arc<TaskQueue>,
    pub(crate) registry: Arc<HandlerRegistry>,
    pub(crate) downloader: Arc<dyn Downloader>,
    pub(crate) stats: Arc<CrawlStats>,
    pub(crate) delay: Duration,
    pub(crate) randomize_user_agent: bool,
    pub(crate) token: CancellationToken,
}

/// Drain the queue until cancelled.
///
/// Cancellation is observed between tasks and while parked, never in the
/// middle of a pipeline: a task already popped runs to the end of its
/// callbacks before the worker exits.
pub(crate) async fn run_worker(worker_id: usize, ctx: Arc<WorkerContext>) {
    debug!("worker {} started", worker_id);

    loop {
        if ctx.token.is_cancelled() {
            break;
        }

        match ctx.queue.try_pop() {
            Some(task) => {
                process_task(&ctx, task).await;

                if !ctx.delay.is_zero() {
                    tokio::select! {
                        _ = ctx.token.cancelled() => break,
                        _ = sleep(ctx.delay) => {}
                    }
                }
            }
            None => {
                // Racing another worker to an empty queue is normal;
                // park until a push arrives.
                tokio::select! {
                    _ = ctx.token.cancelled() => break,
                    _ = ctx.queue.notified() => {}
                }
            }
        }
    }

    debug!("worker {} stopped", worker_id);
}

async fn process_task(ctx: &WorkerContext, task: Task) {
    let handler = ctx.registry.resolve(task.handler());
    let mut request = task.into_request();

    handler.dispatch_request(&mut request);

    if ctx.randomize_user_agent {
        request
            .headers
            .insert("User-Agent".to_string(), random_user_agent().to_string());
    }

    match ctx.downloader.download(request).await {
        Ok(response) => {
            ctx.stats.record_fetched();
            handler.dispatch_response(&response);

            // The DOM is not Send, so parsing and the html callbacks all
            // happen synchronously before the next await point. Dropping
            // the response afterwards releases the body.
            match Document::parse(&response.body, response.url.clone()) {
                Ok(document) => {
                    handler.dispatch_html(&response.request, &response, &document);
                }
                Err(err) => {
                    ctx.stats.record_parse_error();
                    warn!("{}", err);
                    handler.dispatch_error(Some(&response), &err);
                }
            }
        }
        Err(err) => {
            ctx.stats.record_fetch_error();
            error!("{}", err);
            handler.dispatch_error(None, &err);
        }
    }

    ctx.stats.record_completed();
}
