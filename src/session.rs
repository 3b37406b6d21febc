//! Signed-in session: owns the authenticated client and the account flags
//! that decide which part of the app is shown.
use tracing::{info, warn};

use crate::api::model::{LoginRequest, OnboardingRequest, RegisterRequest, UserRole};
use crate::api::AuthService;
use crate::error::FriendlyError;
use crate::validate::validate_credentials;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Auth,
    Main,
}

pub struct Session<A> {
    client: A,
    phase: Phase,
    role: UserRole,
    signed_in: bool,
    onboarding_done: bool,
    needs_onboarding: bool,
    just_registered: bool,
}

impl<A: AuthService> Session<A> {
    pub fn signed_out(client: A) -> Self {
        Self {
            client: client.anonymous(),
            phase: Phase::Auth,
            role: UserRole::Student,
            signed_in: false,
            onboarding_done: false,
            needs_onboarding: false,
            just_registered: false,
        }
    }

    /// Client to use for requests made on behalf of this session.
    pub fn client(&self) -> &A {
        &self.client
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn role(&self) -> UserRole {
        self.role
    }

    pub fn is_signed_in(&self) -> bool {
        self.signed_in
    }

    pub fn onboarding_done(&self) -> bool {
        self.onboarding_done
    }

    pub fn needs_onboarding(&self) -> bool {
        self.needs_onboarding
    }

    pub fn just_registered(&self) -> bool {
        self.just_registered
    }

    /// Adopt `token`. A new account goes straight to onboarding; an existing
    /// one has its profile fetched to restore role and onboarding state.
    pub async fn sign_in(&mut self, token: &str, new_user: bool) {
        self.client = self.client.authorized(token);
        self.signed_in = true;
        self.just_registered = new_user;

        if new_user {
            self.onboarding_done = false;
            self.needs_onboarding = true;
            self.phase = Phase::Main;
            return;
        }

        match self.client.me().await {
            Ok(me) => {
                info!(user_id = me.id, role = me.role.as_str(), "signed in");
                self.role = me.role;
                self.onboarding_done = me.onboarding_done;
                self.needs_onboarding = !me.onboarding_done;
            }
            Err(err) => {
                warn!(?err, "failed to fetch profile; offering onboarding");
                self.needs_onboarding = true;
            }
        }
        self.phase = Phase::Main;
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<(), FriendlyError> {
        let email = email.trim();
        validate_credentials(email, password, false)?;
        let req = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let res = self
            .client
            .login(&req)
            .await
            .map_err(|err| FriendlyError::from_auth(&err))?;
        self.sign_in(&res.token, res.new_user.unwrap_or(false)).await;
        Ok(())
    }

    pub async fn register(&mut self, mut req: RegisterRequest) -> Result<(), FriendlyError> {
        req.email = req.email.trim().to_string();
        validate_credentials(&req.email, &req.password, true)?;
        let role = req.role;
        let res = self
            .client
            .register(&req)
            .await
            .map_err(|err| FriendlyError::from_auth(&err))?;
        self.role = role;
        self.sign_in(&res.token, res.new_user.unwrap_or(true)).await;
        Ok(())
    }

    pub async fn complete_onboarding(
        &mut self,
        payload: &OnboardingRequest,
    ) -> Result<(), FriendlyError> {
        if let Err(err) = self.client.save_onboarding(payload).await {
            return Err(FriendlyError::from_api(&err)
                .unwrap_or_else(|| FriendlyError::Unknown(err.to_string())));
        }
        self.onboarding_done = true;
        self.needs_onboarding = false;
        Ok(())
    }

    pub fn sign_out(&mut self) {
        self.client = self.client.anonymous();
        self.signed_in = false;
        self.onboarding_done = false;
        self.needs_onboarding = false;
        self.just_registered = false;
        self.role = UserRole::Student;
        self.phase = Phase::Auth;
    }
}
