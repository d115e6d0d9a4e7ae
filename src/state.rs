// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::api::search::GroupSearch;
use crate::auth::{OidcVerifier, TokenService};
use crate::config::Config;
use crate::error::Result;
use crate::origin::OriginPolicy;
use crate::subprocess::ShareUtility;

/// Everything a request needs. Built once at startup, read-only afterwards.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub tokens: TokenService,
    pub origins: OriginPolicy,
    pub share: ShareUtility,
    pub search: GroupSearch,
    /// `None` when `oidcprovider` is empty.
    pub oidc: Option<OidcVerifier>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let tokens = TokenService::new(&config.signkey);
        let origins = OriginPolicy::new(&config.allowfrom)?;
        let share = ShareUtility::new(
            config.cboxsharescript.clone(),
            config.cboxshareconfig.clone(),
            config.maxprocs,
        );
        let search = GroupSearch::new(&config.cboxgroupdurl, &config.cboxgroupdsecret)?;

        Ok(Self {
            config: Arc::new(config),
            tokens,
            origins,
            share,
            search,
            oidc: None,
        })
    }

    pub fn with_oidc(mut self, verifier: OidcVerifier) -> Self {
        self.oidc = Some(verifier);
        self
    }
}
