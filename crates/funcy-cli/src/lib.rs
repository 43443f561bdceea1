// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! funcy command-line runner and bundled function packages.

// Sample package, registered through inventory
pub mod mypackage;

pub mod runner;
