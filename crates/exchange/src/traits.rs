pub trait RemoteResponse<T> {
    fn to_model(&self) -> Option<T>;
}
