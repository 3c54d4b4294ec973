/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/// Types for single object upload operation
pub mod upload;

/// Types for single object download operation
pub mod download;
