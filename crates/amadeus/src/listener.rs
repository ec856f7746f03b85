//! Turns a transport reply into a classified result
//!
//! Body chunks are streamed into the [`Response`] as they arrive. The end of
//! the stream triggers parsing and classification; a broken stream or a
//! failed send yields a network error carrying whatever was received.

use futures_util::stream::StreamExt;

use crate::config::ClientConfig;
use crate::error::ResponseError;
use crate::logger::Logger;
use crate::request::Request;
use crate::response::Response;
use crate::transport::{TransportError, TransportResponse};

/// Consumes one transport outcome for `request`
pub(crate) async fn handle(
    request: Request,
    outcome: Result<TransportResponse, TransportError>,
    config: &ClientConfig,
    logger: &dyn Logger,
) -> Result<Response, ResponseError> {
    let result = match outcome {
        Ok(reply) => receive(request, reply).await,
        Err(e) => {
            tracing::debug!("request to {} failed: {e}", request.path());
            let mut response = Response::new(None, Vec::new(), request);
            response.parse();
            Err(ResponseError::network(response))
        }
    };

    log_outcome(&result, config, logger);
    result
}

async fn receive(request: Request, reply: TransportResponse) -> Result<Response, ResponseError> {
    let TransportResponse {
        status,
        headers,
        mut body,
    } = reply;
    let mut response = Response::new(Some(status), headers, request);

    while let Some(chunk) = body.next().await {
        match chunk {
            Ok(bytes) => response.add_chunk(&bytes),
            Err(e) => {
                tracing::debug!("response from {} interrupted: {e}", response.request().path());
                response.parse();
                return Err(ResponseError::network(response));
            }
        }
    }

    response.parse();
    if response.success() {
        Ok(response)
    } else {
        Err(ResponseError::from_response(response))
    }
}

fn log_outcome(
    result: &Result<Response, ResponseError>,
    config: &ClientConfig,
    logger: &dyn Logger,
) {
    if config.debug() {
        match result {
            Ok(response) => logger.log(&format!("{response:#?}")),
            Err(error) => logger.log(&format!("{:#?}", error.response())),
        }
        return;
    }

    if !config.warn() {
        return;
    }
    if let Err(error) = result {
        let description = error
            .description()
            .map_or_else(String::new, ToString::to_string);
        logger.log(&format!("Amadeus {} {description}", error.code()));
    }
}
