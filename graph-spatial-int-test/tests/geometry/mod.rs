//! Geometry creation, update and deletion through the gateway.

mod existing_node_test;
mod geometry_delete_test;
mod geometry_update_test;
