use std::{ops::Deref, time::Duration};

use reqwest::{Client, ClientBuilder};

use crate::error::SegfeedResult;

#[derive(Clone, Default)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(builder: ClientBuilder) -> SegfeedResult<Self> {
        let client = builder.build()?;
        Ok(Self { client })
    }

    /// A client with an overall request timeout. Requests never time out
    /// when `timeout` is `None`.
    pub fn with_timeout(timeout: Option<Duration>) -> SegfeedResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Self::new(builder)
    }
}

impl From<Client> for HttpClient {
    fn from(client: Client) -> Self {
        Self { client }
    }
}

impl Deref for HttpClient {
    type Target = Client;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}
