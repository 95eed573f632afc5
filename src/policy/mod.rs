pub mod fifo;
pub mod lfu;
pub mod lru;
pub mod two_segment;
