// SPDX-FileCopyrightText: 2026 Handover Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the relay core and its external collaborators.

pub mod delivery;

pub use delivery::DeliveryProvider;
