// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod k8s;

pub use k8s::sanitize_k8s_name;
