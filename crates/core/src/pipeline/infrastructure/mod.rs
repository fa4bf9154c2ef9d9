pub mod prefetching_source;
