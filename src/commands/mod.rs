// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::Settings;
use crate::models::User;

pub mod categories;
pub mod dashboard;
pub mod debts;
pub mod doctor;
pub mod exporter;
pub mod settings;
pub mod transactions;
pub mod users;

/// Who is acting, and with which settings.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub settings: Settings,
}
