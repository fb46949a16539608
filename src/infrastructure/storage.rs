use crate::config::ServiceConfig;
use crate::services::storage::S3BlobStore;
use aws_sdk_s3::config::Region;
use std::sync::Arc;
use tracing::info;

pub async fn setup_storage(config: &ServiceConfig) -> Arc<S3BlobStore> {
    let mut loader = aws_config::from_env().region(Region::new(config.s3_region.clone()));

    if let Some(endpoint_url) = &config.s3_endpoint {
        info!("☁️  S3 Storage: {} (Bucket: {})", endpoint_url, config.bucket);
        loader = loader.endpoint_url(endpoint_url);
    } else {
        info!("☁️  S3 Storage: AWS default endpoint (Bucket: {})", config.bucket);
    }

    if let (Some(access_key), Some(secret_key)) = (&config.s3_access_key, &config.s3_secret_key) {
        loader = loader.credentials_provider(aws_sdk_s3::config::Credentials::new(
            access_key.clone(),
            secret_key.clone(),
            None,
            None,
            "static",
        ));
    }

    let aws_config = loader.load().await;

    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .force_path_style(config.s3_endpoint.is_some())
        .build();

    let s3_client = aws_sdk_s3::Client::from_conf(s3_config);
    let bucket = config.bucket.clone();

    // Ensure bucket exists
    match s3_client.head_bucket().bucket(&bucket).send().await {
        Ok(_) => info!("✅ Bucket '{}' is ready", bucket),
        Err(_) => {
            info!("🪣 Bucket '{}' not found, creating...", bucket);
            if let Err(e) = s3_client.create_bucket().bucket(&bucket).send().await {
                tracing::error!("❌ Failed to create bucket '{}': {}", bucket, e);
            } else {
                info!("✅ Bucket '{}' created successfully", bucket);
            }
        }
    }

    Arc::new(S3BlobStore::new(s3_client, bucket))
}
