mod q_table;
mod ring_buffer;

pub use q_table::QTable;
pub use ring_buffer::RingBuffer;
