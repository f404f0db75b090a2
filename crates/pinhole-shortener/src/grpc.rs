use crate::shortener::{ShortenParams, Shortener};
use pinhole_proto_schema::v1 as proto;
use pinhole_proto_schema::v1::shortener_service_server::{self, ShortenerServiceServer};
use std::sync::Arc;
use tonic::{Request, Response, Status};
use tracing::{debug, info, warn};

/// Exposes a [`Shortener`] as the `shortener.v1.ShortenerService` gRPC service.
pub struct ShortenerGrpcServer<S: Shortener> {
    shortener: Arc<S>,
}

impl<S: Shortener> ShortenerGrpcServer<S> {
    pub fn new(shortener: S) -> Self {
        Self {
            shortener: Arc::new(shortener),
        }
    }

    pub fn into_service(self) -> ShortenerServiceServer<Self> {
        ShortenerServiceServer::new(self)
    }
}

impl<S: Shortener> Clone for ShortenerGrpcServer<S> {
    fn clone(&self) -> Self {
        Self {
            shortener: Arc::clone(&self.shortener),
        }
    }
}

#[tonic::async_trait]
impl<S: Shortener> shortener_service_server::ShortenerService for ShortenerGrpcServer<S> {
    async fn create_short_url(
        &self,
        request: Request<proto::CreateShortUrlRequest>,
    ) -> Result<Response<proto::CreateShortUrlResponse>, Status> {
        let request = request.into_inner();
        let params = ShortenParams {
            original_url: request.original_url,
            custom_alias: request.custom_alias,
        };

        match self.shortener.shorten(params).await {
            Ok(code) => {
                info!(short_url = %code, "created short url");
                Ok(Response::new(proto::CreateShortUrlResponse {
                    short_url: code.into_inner(),
                }))
            }
            Err(err) => {
                warn!(error = %err, "create_short_url rejected");
                Err(err.into())
            }
        }
    }

    async fn get_original_url(
        &self,
        request: Request<proto::GetOriginalUrlRequest>,
    ) -> Result<Response<proto::GetOriginalUrlResponse>, Status> {
        let request = request.into_inner();
        debug!(short_url = %request.short_url, "get_original_url");

        let original_url = self
            .shortener
            .resolve(&request.short_url)
            .await
            .map_err(Status::from)?;

        Ok(Response::new(proto::GetOriginalUrlResponse { original_url }))
    }
}
