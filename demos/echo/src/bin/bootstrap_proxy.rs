use echo::router;
use serverless_bridge::apigw::ApiGatewayProxy;
use serverless_bridge::{run_lambda, Shell};

#[tokio::main]
pub async fn main() -> Result<(), lambda_runtime::Error> {
  // TIP: Use the `log4rs` crate for more fine-grained control over logging.
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

  // The function is deployed behind a `/{stage-prefix}/{proxy+}` resource.
  let shell = Shell::new(ApiGatewayProxy::new().with_dynamic_base_path());
  shell.init(router())?;
  shell.start().await?;

  run_lambda(|event| shell.handle_lambda_event(event)).await
}
