use std::io::Read;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectUpload<'a> {
    pub bucket: &'a str,
    pub key: &'a str,
    pub acl: &'a str,
    pub content_length: u64,
}

pub trait ObjectPublisher {
    fn put_object(&self, upload: ObjectUpload<'_>, body: &mut dyn Read) -> Result<(), String>;
}
