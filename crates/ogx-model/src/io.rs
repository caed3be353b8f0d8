//! Load and save entry points.
//!
//! Four input shapes -- readable stream, filesystem path, open descriptor
//! (unix), in-memory byte buffer -- converge on one parse/construct/resolve
//! sequence, so the version-reconciliation and structural-invariant logic
//! is written and exercised exactly once. Only the byte-acquisition step
//! varies per entry point.
//!
//! File handles are scoped resources: acquired at the start of a call and
//! released on every exit path, success or failure. The descriptor entry
//! points never take ownership of the caller's descriptor; they work on a
//! duplicate and close only that.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use prost::Message;

use ogx_core::proto::ModelProto;
use ogx_core::registry::SharedSchemaSource;

use crate::error::ModelError;
use crate::model::Model;

#[cfg(unix)]
use std::os::fd::{BorrowedFd, RawFd};

impl Model {
    /// Reads a serialized envelope from a stream.
    ///
    /// Returns the raw envelope only; the caller still constructs a model
    /// from it ([`Model::from_proto`]) and resolves its graph. The stream
    /// is consumed to end-of-input, and any bytes that do not decode as
    /// envelope fields fail the parse.
    pub fn read_envelope<R: Read>(reader: &mut R) -> Result<ModelProto, ModelError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).map_err(ModelError::system)?;
        Ok(ModelProto::decode(bytes.as_slice())?)
    }

    /// Loads a fully constructed, resolved model from an in-memory
    /// envelope.
    pub fn load_from_bytes(
        bytes: &[u8],
        local_sources: Vec<SharedSchemaSource>,
    ) -> Result<Model, ModelError> {
        let proto = ModelProto::decode(bytes)?;
        let mut model = Model::from_proto(proto, local_sources)?;
        model.graph_mut().resolve(true)?;
        Ok(model)
    }

    /// Loads a model from a file.
    ///
    /// A missing file reports [`ModelError::NoSuchFile`]; any other open
    /// failure is a system error carrying the OS code. The handle is
    /// closed on every exit path.
    pub fn load_from_file(
        path: impl AsRef<Path>,
        local_sources: Vec<SharedSchemaSource>,
    ) -> Result<Model, ModelError> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|err| open_error(path, err))?;
        tracing::debug!(path = %path.display(), "loading model");
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(ModelError::system)?;
        Self::load_from_bytes(&bytes, local_sources)
    }

    /// Loads a model from an open file descriptor.
    ///
    /// A negative descriptor is rejected before any OS call. The
    /// descriptor is duplicated for the read, so the caller keeps
    /// ownership of `fd`; only the duplicate is closed.
    #[cfg(unix)]
    pub fn load_from_fd(
        fd: RawFd,
        local_sources: Vec<SharedSchemaSource>,
    ) -> Result<Model, ModelError> {
        if fd < 0 {
            return Err(ModelError::InvalidDescriptor { fd });
        }
        // SAFETY: fd is non-negative and the caller guarantees it stays
        // open for the duration of this call.
        let owned = unsafe { BorrowedFd::borrow_raw(fd) }
            .try_clone_to_owned()
            .map_err(ModelError::system)?;
        let mut file = File::from(owned);
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(ModelError::system)?;
        Self::load_from_bytes(&bytes, local_sources)
    }

    /// Saves the model to a file, forcing a resolution pass first.
    ///
    /// The persisted envelope always reflects a resolved, validated graph;
    /// the write is flushed before success is reported and the handle is
    /// closed on every exit path.
    pub fn save_to_file(&mut self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|err| open_error(path, err))?;
        tracing::debug!(path = %path.display(), "saving model");
        self.save_to_writer(&mut BufWriter::new(file))
    }

    /// Saves the model to an open file descriptor.
    ///
    /// Same contract as [`Model::save_to_file`]; the caller keeps
    /// ownership of `fd`.
    #[cfg(unix)]
    pub fn save_to_fd(&mut self, fd: RawFd) -> Result<(), ModelError> {
        if fd < 0 {
            return Err(ModelError::InvalidDescriptor { fd });
        }
        // SAFETY: fd is non-negative and the caller guarantees it stays
        // open for the duration of this call.
        let owned = unsafe { BorrowedFd::borrow_raw(fd) }
            .try_clone_to_owned()
            .map_err(ModelError::system)?;
        self.save_to_writer(&mut BufWriter::new(File::from(owned)))
    }

    /// The single serialize-or-fail routine behind both save shapes:
    /// force-resolve, re-export the live graph into the envelope, encode,
    /// write, flush.
    fn save_to_writer<W: Write>(&mut self, writer: &mut W) -> Result<(), ModelError> {
        self.graph_mut().resolve(true)?;
        let proto = self.to_proto();
        let bytes = proto.encode_to_vec();
        writer.write_all(&bytes).map_err(ModelError::system)?;
        writer.flush().map_err(ModelError::system)?;
        Ok(())
    }
}

/// Maps an open/create failure to the boundary taxonomy: missing file and
/// invalid path arguments get distinct kinds, everything else collapses to
/// a system error with the OS code.
fn open_error(path: &Path, err: io::Error) -> ModelError {
    match err.kind() {
        io::ErrorKind::NotFound => ModelError::NoSuchFile {
            path: path.to_path_buf(),
        },
        io::ErrorKind::InvalidInput => ModelError::InvalidPath {
            path: path.to_path_buf(),
        },
        _ => ModelError::system(err),
    }
}
