//! An in-memory user store exposed through generated routes.
//!
//! Requests are dispatched in process, any engine built on the `http` crate can
//! drive [`Api::call`] the same way.

use bytes::Bytes;
use http::{Method, Request};
use http_body_util::{BodyExt, Full};
use micro_rest::codec::default_registry;
use micro_rest::{
    Api, BoxError, Decode, HttpError, Module, Payload, PluralGetter, PluralPoster, QueryParams, RequestContext,
    Resource, SingleDeleter, SingleGetter, async_trait,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Deserialize, Serialize, Clone, Debug)]
struct User {
    name: String,
    zip: String,
}

#[derive(Default)]
struct Users {
    next_id: AtomicU64,
    users: RwLock<BTreeMap<String, User>>,
}

impl Resource for Users {
    micro_rest::capabilities!(PluralGetter, PluralPoster, SingleGetter, SingleDeleter);
}

#[async_trait]
impl PluralGetter for Users {
    async fn get_all(&self, _ctx: &RequestContext, params: &QueryParams) -> Result<Payload, BoxError> {
        let users = self.users.read().await;
        let matching: BTreeMap<_, _> = users
            .iter()
            .filter(|(_, user)| params.get("zip").is_none_or(|zip| zip == user.zip))
            .collect();
        Ok(serde_json::to_value(matching)?)
    }
}

#[async_trait]
impl PluralPoster for Users {
    async fn post_all(&self, _ctx: &RequestContext, decode: Decode<'_>) -> Result<Payload, BoxError> {
        let user: User = decode.decode().await?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed).to_string();
        self.users.write().await.insert(id.clone(), user);
        Ok(serde_json::json!({ "id": id }))
    }
}

#[async_trait]
impl SingleGetter for Users {
    async fn get(&self, _ctx: &RequestContext, pk: &str) -> Result<Payload, BoxError> {
        let users = self.users.read().await;
        let user = users.get(pk).ok_or_else(|| HttpError::not_found(format!("no user {pk}")))?;
        Ok(serde_json::to_value(user)?)
    }
}

#[async_trait]
impl SingleDeleter for Users {
    async fn delete(&self, _ctx: &RequestContext, pk: &str) -> Result<Payload, BoxError> {
        let removed = self.users.write().await.remove(pk);
        removed.map(|_| Payload::Null).ok_or_else(|| HttpError::not_found(format!("no user {pk}")).into())
    }
}

async fn send(api: &Api, method: Method, uri: &str, content_type: &str, body: &'static str) -> Result<(), BoxError> {
    let request = Request::builder()
        .method(method.clone())
        .uri(uri)
        .header(http::header::CONTENT_TYPE, content_type)
        .body(Full::new(Bytes::from_static(body.as_bytes())))?;

    let response = api.call(request).await;
    let status = response.status();
    let allow = response.headers().get("access-control-allow-methods").cloned();
    let body = response.into_body().collect().await?.to_bytes();
    info!(%method, uri, %status, ?allow, body = %String::from_utf8_lossy(&body), "served");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let module = Module::new();
    module.register("users", Users::default())?;

    let mut builder = Api::builder(Arc::new(default_registry()));
    builder.mount("directory", &module)?;
    let api = builder.build()?;

    let json = "application/json";
    let form = "application/x-www-form-urlencoded";
    send(&api, Method::POST, "/directory/users", json, r#"{"name":"hello","zip":"world"}"#).await?;
    send(&api, Method::POST, "/directory/users", form, "name=ferris&zip=crab").await?;
    send(&api, Method::GET, "/directory/users?zip=crab", json, "").await?;
    send(&api, Method::GET, "/directory/users/0", json, "").await?;
    send(&api, Method::OPTIONS, "/directory/users/0", json, "").await?;
    send(&api, Method::DELETE, "/directory/users/0", json, "").await?;
    send(&api, Method::GET, "/directory/users/0", json, "").await?;
    send(&api, Method::PUT, "/directory/users/1", json, "{}").await?;
    Ok(())
}
