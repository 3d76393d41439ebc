use std::time::Duration;

use skyvern_http::{PollOptions, RunState, RunTaskRequest, SkyvernClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let client = SkyvernClient::from_env()?;

    let request = RunTaskRequest::new("Find the title of the top post")
        .url("https://news.ycombinator.com")
        .max_steps(10);

    let options = PollOptions::default()
        .with_timeout(Duration::from_secs(600))
        .with_poll_interval(Duration::from_secs(5));

    let run = client.run_task_and_wait(&request, &options).await?;

    match run.status {
        RunState::Completed => println!("{}: {:?}", run.run_id, run.output),
        other => println!("{} finished as {other}: {:?}", run.run_id, run.failure_reason),
    }

    Ok(())
}
