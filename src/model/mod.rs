// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

pub(crate) mod contract;
mod timestamp;
pub(crate) mod user;
