/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

mod applications;
mod cluster_users;
mod managed_environments;
mod mappings;
mod operations;
mod sync_operations;
