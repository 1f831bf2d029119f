//! Account service - login, registration and sign-out

use nexium_domain::constants::{
    ACCOUNT_LOGOUT_PATH, ACCOUNT_NEW_PATH, ACCOUNT_WHOAMI_PATH, SESSION_LOGIN_PATH,
};
use nexium_domain::{
    Account, AuthMethod, Credential, DispatchError, DispatchResult, RequestDescriptor,
    SessionGrant,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::dispatch::{decode_body, RequestDispatcher};

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    auth: &'a AuthMethod,
}

#[derive(Deserialize)]
struct WhoamiResponse {
    account: Account,
}

/// Account operations
pub struct AccountService {
    dispatcher: RequestDispatcher,
}

impl AccountService {
    /// Account operations over `dispatcher`
    pub fn new(dispatcher: RequestDispatcher) -> Self {
        Self { dispatcher }
    }

    /// Log in and install the granted credential.
    ///
    /// # Errors
    /// `Api` with the server's code (`unknownuser`, `passworderror`, ...) when
    /// the login is refused.
    #[instrument(skip(self, auth))]
    pub async fn login(&self, username: &str, auth: &AuthMethod) -> DispatchResult<Account> {
        self.open_session(SESSION_LOGIN_PATH, username, auth).await
    }

    /// Create an account and log it in.
    ///
    /// # Errors
    /// `Api` with the server's code (`accountexists`, `passwordcomplexity`,
    /// ...) when registration is refused.
    #[instrument(skip(self, auth))]
    pub async fn register(&self, username: &str, auth: &AuthMethod) -> DispatchResult<Account> {
        self.open_session(ACCOUNT_NEW_PATH, username, auth).await
    }

    /// Account the current session belongs to
    pub async fn whoami(&self) -> DispatchResult<Account> {
        let response: WhoamiResponse = self.dispatcher.get_json(ACCOUNT_WHOAMI_PATH).await?;
        Ok(response.account)
    }

    /// Sign out on the server, then end the local session whatever the server
    /// said.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        if self.dispatcher.has_credential() {
            if let Err(err) = self.dispatcher.post(ACCOUNT_LOGOUT_PATH, None).await {
                warn!(error = %err, "server-side logout failed");
            }
        }
        self.dispatcher.renewer().terminate().await;
    }

    async fn open_session(
        &self,
        path: &str,
        username: &str,
        auth: &AuthMethod,
    ) -> DispatchResult<Account> {
        let body = serde_json::to_value(Credentials { username, auth }).map_err(|err| {
            DispatchError::transport(format!("failed to encode credentials: {err}"))
        })?;

        let response =
            self.dispatcher.send_unauthenticated(RequestDescriptor::post(path, Some(body))).await?;
        let grant: SessionGrant = decode_body(response)?;

        self.dispatcher
            .install_credential(Credential::with_refresh(grant.access_token, grant.refresh_token));
        info!(account_id = %grant.account.id, "session opened");

        Ok(grant.account)
    }
}
