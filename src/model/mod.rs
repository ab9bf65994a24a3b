mod flow;

pub use flow::FlowModel;
