mod bounding_box_search_test;
mod distance_search_test;
