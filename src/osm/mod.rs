// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

mod classify;
mod reader;

pub use classify::{
    car_permission, highway_type, is_one_way, lane_count, max_speed, parse_max_speed,
    WayAttributes, CAR_ALLOWED, CAR_NOT_ALLOWED, CAR_RESTRICTED, HIGHWAY_TYPES,
};
pub use reader::model::{Bounds, Feature, Node, Way};
pub use reader::{
    add_features_from_buffer, add_features_from_file, add_features_from_io, FileFormat,
};
