pub mod execution_service;
pub mod reconciler;
pub mod risk_sizer;
pub mod symbol_locks;
pub mod webhook;

#[cfg(test)]
pub mod mocks;
