//! Serving a box as a tree of static files.

use std::io;

use crate::file::File;
use crate::path::PATH_BOX_SEP;
use crate::resource::ResourceBox;

/// A tree of named files, as consumed by static file servers.
pub trait FileSystem {
    fn open(&self, name: &str) -> io::Result<File>;
}

impl FileSystem for ResourceBox {
    fn open(&self, name: &str) -> io::Result<File> {
        ResourceBox::open(self, name).map_err(io::Error::from)
    }
}

/// A [`ResourceBox`] mounted under `/<box name>`.
///
/// Request paths starting with the box name have it removed before lookup,
/// so `/assets/css/site.css` opens `css/site.css` of the `assets` box.
/// Missing files surface as [`io::ErrorKind::NotFound`].
#[derive(Debug, Clone)]
pub struct HttpBox {
    inner: ResourceBox,
}

impl HttpBox {
    pub fn new(inner: ResourceBox) -> HttpBox {
        HttpBox { inner }
    }

    #[inline(always)]
    pub fn inner(&self) -> &ResourceBox {
        &self.inner
    }

    fn strip_prefix<'a>(&self, name: &'a str) -> &'a str {
        let rest = name
            .strip_prefix(PATH_BOX_SEP)
            .and_then(|n| n.strip_prefix(self.inner.name()));
        match rest {
            Some(rest) if rest.is_empty() || rest.starts_with(PATH_BOX_SEP) => rest,
            _ => name,
        }
    }
}

impl FileSystem for HttpBox {
    fn open(&self, name: &str) -> io::Result<File> {
        if name.split(PATH_BOX_SEP).any(|segment| segment == "..") {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid request path `{}`", name),
            ));
        }
        let name = self.strip_prefix(name);
        tracing::trace!(r#box = %self.inner.name(), name, "http open");
        FileSystem::open(&self.inner, name)
    }
}

impl ResourceBox {
    /// Wraps the box for use with a static file server.
    pub fn http_box(&self) -> HttpBox {
        HttpBox::new(self.clone())
    }
}
