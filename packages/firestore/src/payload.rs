/// Anything that can render itself as a request body.
///
/// Document and value encoding is owned by the caller; the engine only
/// needs the serialized text.
pub trait Payload {
    fn to_body(&self) -> String;
}

impl Payload for serde_json::Value {
    fn to_body(&self) -> String {
        self.to_string()
    }
}

impl Payload for String {
    fn to_body(&self) -> String {
        self.clone()
    }
}

impl Payload for str {
    fn to_body(&self) -> String {
        self.to_string()
    }
}

impl<T: Payload + ?Sized> Payload for &T {
    fn to_body(&self) -> String {
        (**self).to_body()
    }
}
