//! Game API over HTTP.

use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use stakes_tictactoe::{Address, Game, GameId};
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::{ClientError, GameApi};
use crate::api::{
    BalanceResponse, CALLER_HEADER, CallResponse, CallResult, CreateGameRequest, FundRequest,
    MoveRequest,
};

/// Body of a fund response.
#[derive(serde::Deserialize)]
struct FundResponse {
    result: CallResult<u64>,
}

/// HTTP client for the game service.
#[derive(Debug, Clone)]
pub struct HttpClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpClient {
    /// Creates a client for the service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the underlying client cannot be built.
    #[instrument(skip(base_url), fields(base_url = %base_url.as_ref()))]
    pub fn new(base_url: impl AsRef<str>, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.as_ref().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Base URL requests go to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `/accounts/{address}/{action}` with the address escaped as one segment.
    fn account_url(&self, address: &Address, action: &str) -> Result<Url, ClientError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::new(format!("Invalid base URL '{}': {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|()| ClientError::new(format!("Base URL cannot take a path: {}", self.base_url)))?
            .pop_if_empty()
            .extend(["accounts", address.as_str(), action]);
        Ok(url)
    }

    /// Posts a move-submitting call as `caller`.
    async fn call(
        &self,
        caller: &Address,
        path: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<CallResponse, ClientError> {
        let request = self
            .client
            .post(self.url(path))
            .header(CALLER_HEADER, caller.as_str())
            .json(body);
        let response = send(request).await?;
        match response.status() {
            StatusCode::OK | StatusCode::BAD_REQUEST => decode(response).await,
            status => Err(unexpected(status, response).await),
        }
    }
}

async fn send(request: RequestBuilder) -> Result<Response, ClientError> {
    let response = request.send().await?;
    debug!(status = %response.status(), url = %response.url(), "Response received");
    Ok(response)
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    response
        .json::<T>()
        .await
        .map_err(|e| ClientError::new(format!("Failed to decode response: {}", e)))
}

async fn unexpected(status: StatusCode, response: Response) -> ClientError {
    let body = response.text().await.unwrap_or_default();
    warn!(%status, body = %body, "Unexpected response");
    ClientError::new(format!("Server returned {}: {}", status, body))
}

#[async_trait::async_trait]
impl GameApi for HttpClient {
    #[instrument(skip(self, caller), fields(caller = %caller))]
    async fn create_game(
        &self,
        caller: &Address,
        bet_amount: u64,
        move_index: u64,
        mv: u64,
    ) -> Result<CallResponse, ClientError> {
        let body = CreateGameRequest {
            bet_amount,
            move_index,
            mv,
        };
        self.call(caller, "/games", &body).await
    }

    #[instrument(skip(self, caller), fields(caller = %caller))]
    async fn join_game(
        &self,
        caller: &Address,
        game_id: GameId,
        move_index: u64,
        mv: u64,
    ) -> Result<CallResponse, ClientError> {
        let body = MoveRequest { move_index, mv };
        self.call(caller, &format!("/games/{}/join", game_id), &body)
            .await
    }

    #[instrument(skip(self, caller), fields(caller = %caller))]
    async fn play(
        &self,
        caller: &Address,
        game_id: GameId,
        move_index: u64,
        mv: u64,
    ) -> Result<CallResponse, ClientError> {
        let body = MoveRequest { move_index, mv };
        self.call(caller, &format!("/games/{}/play", game_id), &body)
            .await
    }

    #[instrument(skip(self))]
    async fn get_game(&self, game_id: GameId) -> Result<Option<Game>, ClientError> {
        let response = send(self.client.get(self.url(&format!("/games/{}", game_id)))).await?;
        match response.status() {
            StatusCode::OK => decode(response).await.map(Some),
            StatusCode::NOT_FOUND => Ok(None),
            status => Err(unexpected(status, response).await),
        }
    }

    #[instrument(skip(self))]
    async fn list_games(&self) -> Result<Vec<Game>, ClientError> {
        let response = send(self.client.get(self.url("/games"))).await?;
        match response.status() {
            StatusCode::OK => decode(response).await,
            status => Err(unexpected(status, response).await),
        }
    }

    #[instrument(skip(self, address), fields(address = %address))]
    async fn balance(&self, address: &Address) -> Result<u64, ClientError> {
        let url = self.account_url(address, "balance")?;
        let response = send(self.client.get(url)).await?;
        match response.status() {
            StatusCode::OK => Ok(decode::<BalanceResponse>(response).await?.balance),
            status => Err(unexpected(status, response).await),
        }
    }

    #[instrument(skip(self, address), fields(address = %address))]
    async fn fund(&self, address: &Address, amount: u64) -> Result<CallResult<u64>, ClientError> {
        let url = self.account_url(address, "fund")?;
        let response = send(self.client.post(url).json(&FundRequest { amount })).await?;
        match response.status() {
            StatusCode::OK | StatusCode::BAD_REQUEST => {
                Ok(decode::<FundResponse>(response).await?.result)
            }
            StatusCode::FORBIDDEN => Err(ClientError::new("Faucet is disabled on the server")),
            status => Err(unexpected(status, response).await),
        }
    }
}
