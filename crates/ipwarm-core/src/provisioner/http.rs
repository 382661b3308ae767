//! Provider-API backed IP provisioner

use super::IpProvisioner;
use crate::provider::{ApiFailure, ProviderClient};
use async_trait::async_trait;
use ipwarm_common::{Error, Result};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Serialize)]
struct AllocateRequest<'a> {
    count: u32,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    subusers: &'a [String],
    warmup: bool,
}

#[derive(Debug, Deserialize)]
struct AllocateResponse {
    ips: Vec<AllocatedIp>,
}

#[derive(Debug, Deserialize)]
struct AllocatedIp {
    ip: String,
}

#[derive(Debug, Serialize)]
struct CreatePoolRequest<'a> {
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct PoolResponse {
    name: String,
}

#[derive(Debug, Serialize)]
struct AddToPoolRequest<'a> {
    ip: &'a str,
}

/// IP provisioner talking to the provider's `/v3/ips` endpoints
pub struct HttpIpProvisioner {
    client: ProviderClient,
}

impl HttpIpProvisioner {
    pub fn new(client: ProviderClient) -> Self {
        Self { client }
    }

    fn failure(action: &str, failure: ApiFailure) -> Error {
        Error::Provisioner(format!("{} failed: {}", action, failure))
    }

    fn request_error(action: &str, e: reqwest::Error) -> Error {
        Error::Provisioner(format!("{} request failed: {}", action, e))
    }

    /// The provider answers 409, or 400 with an "already exists" message, for duplicate pools
    fn is_existing_pool(failure: &ApiFailure) -> bool {
        failure.status == StatusCode::CONFLICT
            || (failure.status == StatusCode::BAD_REQUEST
                && failure.body.to_ascii_lowercase().contains("already exists"))
    }
}

#[async_trait]
impl IpProvisioner for HttpIpProvisioner {
    async fn allocate(
        &self,
        count: u32,
        subusers: &[String],
        provider_warmup: bool,
    ) -> Result<Vec<String>> {
        let body = AllocateRequest {
            count,
            subusers,
            warmup: provider_warmup,
        };

        let response = self
            .client
            .request(Method::POST, &["v3", "ips"])
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::request_error("Allocate IPs", e))?;

        let response = ProviderClient::check(response)
            .await
            .map_err(|f| Self::failure("Allocate IPs", f))?;

        let allocated: AllocateResponse = response
            .json()
            .await
            .map_err(|e| Error::Provisioner(format!("Invalid allocate response: {}", e)))?;

        let addresses: Vec<String> = allocated.ips.into_iter().map(|ip| ip.ip).collect();
        info!(count = addresses.len(), "Allocated dedicated IP addresses");

        Ok(addresses)
    }

    async fn create_pool(&self, name: &str) -> Result<String> {
        let response = self
            .client
            .request(Method::POST, &["v3", "ips", "pools"])
            .json(&CreatePoolRequest { name })
            .send()
            .await
            .map_err(|e| Self::request_error("Create pool", e))?;

        match ProviderClient::check(response).await {
            Ok(response) => {
                let pool: PoolResponse = response
                    .json()
                    .await
                    .map_err(|e| Error::Provisioner(format!("Invalid pool response: {}", e)))?;
                info!(pool = %pool.name, "Created IP pool");
                Ok(pool.name)
            }
            Err(failure) if Self::is_existing_pool(&failure) => {
                debug!(pool = %name, "IP pool already exists");
                Ok(name.to_string())
            }
            Err(failure) => Err(Self::failure("Create pool", failure)),
        }
    }

    async fn add_to_pool(&self, pool_name: &str, address: &str) -> Result<()> {
        let response = self
            .client
            .request(Method::POST, &["v3", "ips", "pools", pool_name, "ips"])
            .json(&AddToPoolRequest { ip: address })
            .send()
            .await
            .map_err(|e| Self::request_error("Add IP to pool", e))?;

        ProviderClient::check(response)
            .await
            .map_err(|f| Self::failure("Add IP to pool", f))?;

        debug!(pool = %pool_name, ip = %address, "Added IP address to pool");
        Ok(())
    }

    async fn delete_pool(&self, pool_name: &str) -> Result<()> {
        let response = self
            .client
            .request(Method::DELETE, &["v3", "ips", "pools", pool_name])
            .send()
            .await
            .map_err(|e| Self::request_error("Delete pool", e))?;

        ProviderClient::check(response)
            .await
            .map_err(|f| Self::failure("Delete pool", f))?;

        info!(pool = %pool_name, "Deleted IP pool");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipwarm_common::config::ProviderConfig;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provisioner(server: &MockServer) -> HttpIpProvisioner {
        let config = ProviderConfig {
            api_url: server.uri(),
            api_key: "SG.key".to_string(),
            timeout_secs: 5,
        };
        HttpIpProvisioner::new(ProviderClient::new(&config).unwrap())
    }

    #[tokio::test]
    async fn test_allocate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/ips"))
            .and(header("authorization", "Bearer SG.key"))
            .and(body_json(json!({
                "count": 2,
                "subusers": ["alice"],
                "warmup": false
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "ips": [
                    {"ip": "192.0.2.10", "subusers": ["alice"]},
                    {"ip": "192.0.2.11", "subusers": ["alice"]}
                ],
                "remaining_ips": 0,
                "warmup": false
            })))
            .expect(1)
            .mount(&server)
            .await;

        let addresses = provisioner(&server)
            .allocate(2, &["alice".to_string()], false)
            .await
            .unwrap();

        assert_eq!(addresses, vec!["192.0.2.10", "192.0.2.11"]);
    }

    #[tokio::test]
    async fn test_allocate_without_subusers_omits_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/ips"))
            .and(body_json(json!({"count": 1, "warmup": false})))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"ips": [{"ip": "192.0.2.20"}]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let addresses = provisioner(&server).allocate(1, &[], false).await.unwrap();
        assert_eq!(addresses, vec!["192.0.2.20"]);
    }

    #[tokio::test]
    async fn test_allocate_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/ips"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let err = provisioner(&server).allocate(1, &[], false).await.unwrap_err();
        assert!(matches!(err, Error::Provisioner(msg) if msg.contains("403")));
    }

    #[tokio::test]
    async fn test_create_pool() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/ips/pools"))
            .and(body_json(json!({"name": "mypool"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "mypool"})))
            .expect(1)
            .mount(&server)
            .await;

        let id = provisioner(&server).create_pool("mypool").await.unwrap();
        assert_eq!(id, "mypool");
    }

    #[tokio::test]
    async fn test_create_existing_pool_is_ok() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/ips/pools"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "errors": [{"field": null, "message": "This pool name already exists"}]
            })))
            .mount(&server)
            .await;

        let id = provisioner(&server).create_pool("mypool").await.unwrap();
        assert_eq!(id, "mypool");
    }

    #[tokio::test]
    async fn test_create_pool_other_bad_request_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/ips/pools"))
            .respond_with(ResponseTemplate::new(400).set_body_string("name too long"))
            .mount(&server)
            .await;

        assert!(provisioner(&server).create_pool("mypool").await.is_err());
    }

    #[tokio::test]
    async fn test_add_to_pool_and_delete() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/ips/pools/mypool/ips"))
            .and(body_json(json!({"ip": "192.0.2.10"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "ip": "192.0.2.10",
                "pools": ["mypool"]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/v3/ips/pools/mypool"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let provisioner = provisioner(&server);
        provisioner.add_to_pool("mypool", "192.0.2.10").await.unwrap();
        provisioner.delete_pool("mypool").await.unwrap();
    }
}
