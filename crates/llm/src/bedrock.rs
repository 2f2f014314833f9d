use crate::models::{Completion, CompletionRequest};
use akasha_core::{Error, Result, RetryPolicy};
use aws_config::BehaviorVersion;
use aws_sdk_bedrockruntime::{
    error::{DisplayErrorContext, SdkError},
    types::{ContentBlock, ConversationRole, ConverseOutput, InferenceConfiguration, Message},
    Client,
};
use aws_smithy_runtime_api::client::orchestrator::HttpResponse;
use log::{error, info};

/// Claude models served through the Bedrock Converse API.
pub struct BedrockClient {
    client: Client,
    retry: RetryPolicy,
}

impl BedrockClient {
    pub async fn new_with_region(retry: RetryPolicy, region: &str) -> Result<Self> {
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;
        let client = Client::new(&aws_config);

        Ok(Self { client, retry })
    }

    pub async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        self.retry
            .run("Bedrock converse", || self.try_complete(request))
            .await
    }

    async fn try_complete(&self, request: &CompletionRequest) -> Result<Completion> {
        let message = user_message(&request.prompt)?;

        info!("Sending request to Bedrock model: {}", request.model);
        let response = self
            .client
            .converse()
            .model_id(&request.model)
            .messages(message)
            .inference_config(
                InferenceConfiguration::builder()
                    .max_tokens(request.max_tokens as i32)
                    .temperature(request.temperature)
                    .build(),
            )
            .send()
            .await
            .map_err(|e| {
                error!("Bedrock send error: {:?}", e);
                sdk_error(e)
            })?;

        info!(
            "Received response from Bedrock model: {} (stop_reason={:?})",
            request.model,
            response.stop_reason()
        );

        let blocks = match response.output() {
            Some(ConverseOutput::Message(message)) => message.content(),
            _ => return Err(Error::malformed("Bedrock response contained no message")),
        };
        let usage = response
            .usage()
            .map(|usage| (usage.input_tokens(), usage.output_tokens()));

        completion_from_blocks(&request.model, blocks, usage)
    }
}

fn user_message(prompt: &str) -> Result<Message> {
    Message::builder()
        .role(ConversationRole::User)
        .content(ContentBlock::Text(prompt.to_string()))
        .build()
        .map_err(|e| Error::configuration(format!("Failed to build Bedrock message: {}", e)))
}

fn completion_from_blocks(
    model: &str,
    blocks: &[ContentBlock],
    usage: Option<(i32, i32)>,
) -> Result<Completion> {
    let (input_tokens, output_tokens) =
        usage.ok_or_else(|| Error::malformed("Bedrock response did not report token usage"))?;

    let text: String = blocks
        .iter()
        .filter_map(|block| block.as_text().ok())
        .map(String::as_str)
        .collect();

    Ok(Completion {
        text,
        model: model.to_string(),
        prompt_tokens: input_tokens.max(0) as u32,
        completion_tokens: output_tokens.max(0) as u32,
    })
}

fn sdk_error<E>(err: SdkError<E, HttpResponse>) -> Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    let status = err.raw_response().map(|raw| raw.status().as_u16());
    let details = DisplayErrorContext(&err).to_string();
    match (err, status) {
        (SdkError::ConstructionFailure(_), _) => Error::configuration(details),
        (SdkError::ServiceError(_), Some(status)) => {
            Error::from_http_status("Bedrock", status, &details)
        }
        _ => Error::provider(details),
    }
}
