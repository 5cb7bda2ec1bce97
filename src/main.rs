use std::sync::Arc;

use dotenvy::dotenv;
use quiztrainer::{
    api,
    config::Config,
    database::connection::Connection,
    schema::schema,
    telemetry, AppContext, BoxError,
};
use teloxide::{
    error_handlers::LoggingErrorHandler,
    prelude::*,
    update_listeners::webhooks::{self, Options},
};

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    dotenv().ok();
    let config = Config::from_env()?;
    telemetry::init_tracing(config.log_level)?;

    let connection = Connection::connect(&config.database_url).await?;
    connection.run_migrations().await?;
    let ctx = AppContext::new(Arc::new(connection), &config.random_topic_label);

    if let Some(addr) = config.api_addr {
        let api_ctx = ctx.clone();
        tokio::spawn(async move {
            if let Err(e) = api::serve(addr, api_ctx).await {
                tracing::error!("admin API stopped: {e}");
            }
        });
    }

    let bot = Bot::new(&config.teloxide_token);
    tracing::info!("Starting bot...");

    let mut dispatcher = Dispatcher::builder(bot.clone(), schema::<Connection>())
        .dependencies(dptree::deps![ctx])
        .enable_ctrlc_handler()
        .build();

    match config.webhook {
        Some(webhook) => {
            let listener = webhooks::axum(bot, Options::new(webhook.addr, webhook.url)).await?;
            dispatcher
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("An error from the update listener"),
                )
                .await
        }
        None => dispatcher.dispatch().await,
    }

    Ok(())
}
