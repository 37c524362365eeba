use echo::router;
use serverless_bridge::service::Service;
use serverless_bridge::{run_lambda, Shell};

#[tokio::main]
pub async fn main() -> Result<(), lambda_runtime::Error> {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

  let shell = Shell::new(Service::new());
  shell.init(router())?;
  shell.start().await?;

  run_lambda(|event| shell.handle_lambda_event(event)).await
}
