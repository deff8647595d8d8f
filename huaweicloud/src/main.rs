use huaweicloud::jobs::{wait_for_job, CdnTask, CommonJob, SwrJob};
use huaweicloud::operations::{CdnApi, ImsApi, SwrApi};
use huaweicloud::{Client, Config, Context, WaitConfig};
use std::env;
use std::time::Duration;

const USAGE: &str = "usage: hcloud-wait <service> <job-id> [timeout-seconds]";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let mut args = env::args().skip(1);
    let (service, job_id) = match (args.next(), args.next()) {
        (Some(service), Some(job_id)) => (service, job_id),
        _ => return Err(USAGE.into()),
    };
    let timeout = match args.next() {
        Some(secs) => Duration::from_secs(secs.parse()?),
        None => Duration::from_secs(600),
    };

    let client = Client::new(Config::from_env()?)?;
    let svc = client.service(&service)?;
    let wait = wait_for_service(&service, timeout);

    // Interrupting the wait cancels it instead of killing the process mid-poll.
    let ctx = Context::new();
    let on_signal = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let summary = match service.as_str() {
        "swr" => format!("{:?}", wait_for_job::<SwrJob>(&svc, &ctx, &job_id, &wait).await?),
        "cdn" => format!("{:?}", wait_for_job::<CdnTask>(&svc, &ctx, &job_id, &wait).await?),
        _ => format!("{:?}", wait_for_job::<CommonJob>(&svc, &ctx, &job_id, &wait).await?),
    };

    tracing::info!(job_id = %job_id, "Job finished: {}", summary);
    Ok(())
}

/// Pacing the service's own operations use, or the generic job pacing.
fn wait_for_service(service: &str, timeout: Duration) -> WaitConfig {
    match service {
        "swr" => SwrApi::job_wait(timeout),
        "cdn" => CdnApi::task_wait(timeout),
        "ims" => ImsApi::registration_wait(timeout),
        _ => WaitConfig::job(timeout),
    }
}
