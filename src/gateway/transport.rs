// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use async_trait::async_trait;
use log::debug;
use reqwest::multipart;
use url::Url;

use crate::{
    credentials::Token,
    error::{self, Result},
    metadata,
    model::contract::Upload,
};

use super::endpoint::Endpoint;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Method {
    Get,
    Post,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match *self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        })
    }
}

impl From<Method> for reqwest::Method {
    fn from(value: Method) -> Self {
        match value {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Delete => Self::DELETE,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) enum Body {
    Empty,
    Json(serde_json::Value),
    Multipart(Upload),
}

#[derive(Clone, Debug)]
pub(crate) struct Request {
    pub(crate) endpoint: Endpoint,
    pub(crate) bearer: Option<Token>,
    pub(crate) body: Body,
}

/// A raw response. Interpreting the status is left to the caller.
#[derive(Clone, Debug)]
pub(crate) struct Response {
    pub(crate) status: u16,
    pub(crate) body: Vec<u8>,
}

#[async_trait]
pub(crate) trait Transport: Send + Sync {
    async fn send(&self, request: Request) -> Result<Response>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn send(&self, request: Request) -> Result<Response> {
        (**self).send(request).await
    }
}

/// HTTP(S) transport to a service rooted at a base URL.
pub(crate) struct Http {
    client: reqwest::Client,
    base: Url,
}

impl Http {
    pub(crate) fn new(base: Url) -> Result<Self> {
        if base.cannot_be_a_base() {
            return Err(error::Api::BaseUrl(base).into());
        }

        let client = reqwest::Client::builder()
            .user_agent(metadata::USER_AGENT.as_str())
            .build()?;
        Ok(Self { client, base })
    }

    fn url(&self, endpoint: &Endpoint) -> Result<Url> {
        let mut url = self.base.clone();
        _ = url
            .path_segments_mut()
            .map_err(|()| error::Api::BaseUrl(self.base.clone()))?
            .pop_if_empty()
            .extend(endpoint.segments());
        Ok(url)
    }
}

fn form(upload: Upload) -> multipart::Form {
    let file = multipart::Part::bytes(upload.bytes).file_name(upload.file_name);
    let mut form = multipart::Form::new()
        .part("file", file)
        .text("title", upload.title);
    if let Some(client_name) = upload.client_name {
        form = form.text("clientName", client_name);
    }
    if let Some(contract_type) = upload.contract_type {
        form = form.text("contractType", contract_type);
    }
    form
}

#[async_trait]
impl Transport for Http {
    async fn send(&self, request: Request) -> Result<Response> {
        let url = self.url(&request.endpoint)?;
        debug!("Sending {} to {}", request.endpoint, url);

        let mut builder = self
            .client
            .request(request.endpoint.method().into(), url);
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token.expose());
        }
        builder = match request.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(&value),
            Body::Multipart(upload) => builder.multipart(form(upload)),
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        debug!(
            "Received HTTP {} ({} bytes) for {}",
            status,
            body.len(),
            request.endpoint
        );
        Ok(Response { status, body })
    }
}
