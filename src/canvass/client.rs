//! Client side of the backend HTTP surface.

use log::debug;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use snafu::prelude::*;
use std::time::Duration;

use canvass_core::Resident;

use crate::canvass::store::WriteMode;
use crate::canvass::*;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct UpdateReply {
    mode: WriteMode,
}

#[derive(Debug, Deserialize)]
struct SyncReply {
    count: usize,
}

#[derive(Debug, Deserialize)]
struct FetchReply {
    #[serde(default)]
    residents: Vec<Resident>,
}

#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> CanvassResult<BackendClient> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context(HttpSnafu { url: base_url })?;
        Ok(BackendClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, route: &str) -> String {
        format!("{}/{}", self.base_url, route)
    }

    pub async fn update_resident(&self, r: &Resident) -> CanvassResult<WriteMode> {
        let reply: UpdateReply = self.post("update-resident", r).await?;
        Ok(reply.mode)
    }

    pub async fn sync_residents(&self, residents: &[Resident]) -> CanvassResult<usize> {
        let reply: SyncReply = self.post("sync-residents", residents).await?;
        Ok(reply.count)
    }

    pub async fn fetch_residents(&self) -> CanvassResult<Vec<Resident>> {
        let url = self.url("fetch-residents");
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .context(HttpSnafu { url: url.clone() })?;
        let reply: FetchReply = read_reply(resp, url).await?;
        Ok(reply.residents)
    }

    async fn post<B, T>(&self, route: &str, body: &B) -> CanvassResult<T>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(route);
        debug!("post: {}", url);
        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .context(HttpSnafu { url: url.clone() })?;
        read_reply(resp, url).await
    }
}

async fn read_reply<T: DeserializeOwned>(resp: reqwest::Response, url: String) -> CanvassResult<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return RemoteStatusSnafu {
            url,
            status: status.as_u16(),
            body,
        }
        .fail();
    }
    resp.json().await.context(HttpSnafu { url })
}
