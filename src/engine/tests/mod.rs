pub mod helpers;

mod tests_count;
mod tests_intersect;
mod tests_union;
