pub mod greedy;
pub mod q_table;

pub use greedy::GreedyAgent;
pub use q_table::{QTableAgent, QTableAgentConfig};
