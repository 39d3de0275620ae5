pub mod bundle;
pub mod config;
pub mod encodings;
pub mod flit;
pub mod task;

pub use bundle::{Axi4Bundle, Decoupled};
pub use encodings::{BurstType, Channel, RespType};
pub use flit::{AddressFlit, ReadBatch, ReadDataFlit, WriteBatch, WriteDataFlit, WriteResponseFlit};
pub use task::{AxTask, BTask, RTask, ReadPayload, Task, TaskMeta, WTask, WritePayload};
