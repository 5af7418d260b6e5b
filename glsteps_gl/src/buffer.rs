use std::fmt;
use std::mem::size_of;
use std::ops::BitOr;

use bytemuck::Pod;
use gl::types::*;

use crate::api::GlApi;
use crate::error::GlError;

/// Flags for `glNamedBufferStorage`. Combine them with `|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StorageFlags(pub GLbitfield);

impl StorageFlags {
    /// Contents are fixed at creation.
    pub const NONE: StorageFlags = StorageFlags(0);
    /// Contents may be rewritten with [`Buffer::update`].
    pub const DYNAMIC: StorageFlags = StorageFlags(gl::DYNAMIC_STORAGE_BIT);
    pub const MAP_READ: StorageFlags = StorageFlags(gl::MAP_READ_BIT);
    pub const MAP_WRITE: StorageFlags = StorageFlags(gl::MAP_WRITE_BIT);
    pub const CLIENT: StorageFlags = StorageFlags(gl::CLIENT_STORAGE_BIT);

    pub fn contains(self, other: StorageFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for StorageFlags {
    type Output = StorageFlags;

    fn bitor(self, rhs: StorageFlags) -> StorageFlags {
        StorageFlags(self.0 | rhs.0)
    }
}

/// Indexed binding points a buffer can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferTarget {
    Uniform,
    ShaderStorage,
}

impl BufferTarget {
    pub fn gl_enum(self) -> GLenum {
        match self {
            BufferTarget::Uniform => gl::UNIFORM_BUFFER,
            BufferTarget::ShaderStorage => gl::SHADER_STORAGE_BUFFER,
        }
    }
}

/// A fixed-size GPU buffer with immutable storage. Deleted when dropped.
///
/// Updates and read-backs are bounds-checked here; a range that doesn't fit never reaches the
/// driver.
pub struct Buffer<'gl, A: GlApi + ?Sized> {
    gl: &'gl A,
    handle: GLuint,
    size: usize,
    flags: StorageFlags,
}

impl<'gl, A: GlApi + ?Sized> Buffer<'gl, A> {
    pub fn handle(&self) -> GLuint { self.handle }

    pub fn size(&self) -> usize { self.size }

    pub fn flags(&self) -> StorageFlags { self.flags }

    /// Allocates `size` bytes, filled from `initial` when given (which must be exactly `size`
    /// bytes long).
    pub fn new(gl: &'gl A, size: usize, initial: Option<&[u8]>, flags: StorageFlags) -> Result<Self, GlError> {
        if size == 0 {
            return Err(GlError::EmptyBuffer);
        }

        if let Some(data) = initial {
            if data.len() != size {
                return Err(GlError::SizeMismatch { expected: size, actual: data.len() });
            }
        }

        let handle = gl.create_buffer();
        if handle == 0 {
            return Err(GlError::ZeroHandle("glCreateBuffers"));
        }
        gl.named_buffer_storage(handle, size, initial, flags.0);

        Ok(Self { gl, handle, size, flags })
    }

    /// A buffer holding exactly `data`.
    pub fn with_data<T: Pod>(gl: &'gl A, data: &[T], flags: StorageFlags) -> Result<Self, GlError> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        Self::new(gl, bytes.len(), Some(bytes), flags)
    }

    /// An uninitialised buffer sized for one `T`, typically a per-frame uniform block.
    pub fn for_value<T: Pod>(gl: &'gl A, flags: StorageFlags) -> Result<Self, GlError> {
        Self::new(gl, size_of::<T>(), None, flags)
    }

    fn check_range(&self, offset: usize, len: usize) -> Result<(), GlError> {
        match offset.checked_add(len) {
            Some(end) if end <= self.size => Ok(()),
            end => Err(GlError::OutOfBounds { offset, end: end.unwrap_or(usize::MAX), size: self.size }),
        }
    }

    /// Overwrites `bytes.len()` bytes starting at `offset`. Only buffers created with
    /// [`StorageFlags::DYNAMIC`] accept updates.
    pub fn update(&self, offset: usize, bytes: &[u8]) -> Result<(), GlError> {
        if !self.flags.contains(StorageFlags::DYNAMIC) {
            return Err(GlError::NotDynamic(self.handle));
        }
        self.check_range(offset, bytes.len())?;
        self.gl.named_buffer_sub_data(self.handle, offset, bytes);
        Ok(())
    }

    /// Overwrites the start of the buffer with `value`.
    pub fn write<T: Pod>(&self, value: &T) -> Result<(), GlError> {
        self.update(0, bytemuck::bytes_of(value))
    }

    /// Copies `out.len()` bytes starting at `offset` back from the GPU.
    pub fn read(&self, offset: usize, out: &mut [u8]) -> Result<(), GlError> {
        self.check_range(offset, out.len())?;
        self.gl.get_named_buffer_sub_data(self.handle, offset, out);
        Ok(())
    }

    /// Reads a `T` back from the start of the buffer.
    pub fn read_value<T: Pod>(&self) -> Result<T, GlError> {
        let mut value = T::zeroed();
        self.read(0, bytemuck::bytes_of_mut(&mut value))?;
        Ok(value)
    }

    /// Binds the whole buffer to `index` of `target`, like `glBindBufferRange(.., 0, size)`.
    pub fn bind_range(&self, target: BufferTarget, index: GLuint) {
        self.gl.bind_buffer_range(target.gl_enum(), index, self.handle, 0, self.size);
    }

    pub fn bind_base(&self, target: BufferTarget, index: GLuint) {
        self.gl.bind_buffer_base(target.gl_enum(), index, self.handle);
    }
}

impl<'gl, A: GlApi + ?Sized> Drop for Buffer<'gl, A> {
    fn drop(&mut self) {
        self.gl.delete_buffer(self.handle);
    }
}

impl<'gl, A: GlApi + ?Sized> fmt::Debug for Buffer<'gl, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Buffer ( {}, {} bytes, {:?} )", self.handle, self.size, self.flags)
    }
}

#[cfg(test)]
mod test {
    use bytemuck::{Pod, Zeroable};

    use super::*;
    use crate::fake::{FakeGl, Kind};

    #[repr(C)]
    #[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
    struct FrameBlock {
        mvp: [[f32; 4]; 4],
        is_wireframe: i32,
    }

    fn sample_block() -> FrameBlock {
        let mut mvp = [[0.0; 4]; 4];
        for (i, col) in mvp.iter_mut().enumerate() {
            col[i] = 1.0 + i as f32;
        }
        FrameBlock { mvp, is_wireframe: 1 }
    }

    #[test]
    fn struct_round_trips_through_a_buffer_of_its_exact_size() {
        let gl = FakeGl::new();
        let buffer = Buffer::for_value::<FrameBlock>(&gl, StorageFlags::DYNAMIC).unwrap();
        assert_eq!(buffer.size(), size_of::<FrameBlock>());

        let block = sample_block();
        buffer.write(&block).unwrap();

        assert_eq!(buffer.read_value::<FrameBlock>().unwrap(), block);
    }

    #[test]
    fn initial_data_is_uploaded_with_storage() {
        let gl = FakeGl::new();
        let indices: [u32; 6] = [0, 1, 2, 2, 3, 0];
        let buffer = Buffer::with_data(&gl, &indices, StorageFlags::NONE).unwrap();

        assert_eq!(buffer.size(), 24);
        assert_eq!(gl.buffer_contents(buffer.handle()).unwrap(), bytemuck::cast_slice::<u32, u8>(&indices));
        assert_eq!(gl.buffer_flags(buffer.handle()), Some(0));
    }

    #[test]
    fn partial_update_lands_at_the_offset() {
        let gl = FakeGl::new();
        let buffer = Buffer::new(&gl, 8, Some(&[0; 8]), StorageFlags::DYNAMIC).unwrap();

        buffer.update(4, &[9, 9]).unwrap();

        let mut out = [0u8; 8];
        buffer.read(0, &mut out).unwrap();
        assert_eq!(out, [0, 0, 0, 0, 9, 9, 0, 0]);
    }

    #[test]
    fn out_of_bounds_update_never_reaches_the_driver() {
        let gl = FakeGl::new();
        let buffer = Buffer::new(&gl, 4, None, StorageFlags::DYNAMIC).unwrap();

        match buffer.update(2, &[1, 2, 3]) {
            Err(GlError::OutOfBounds { offset: 2, end: 5, size: 4 }) => {}
            other => panic!("unexpected {:?}", other),
        }
        assert!(buffer.update(usize::MAX, &[1]).is_err());
        assert!(buffer.read(3, &mut [0u8; 2]).is_err());
        assert_eq!(gl.count_of("glNamedBufferSubData"), 0);
        assert_eq!(gl.count_of("glGetNamedBufferSubData"), 0);
    }

    #[test]
    fn immutable_storage_refuses_updates() {
        let gl = FakeGl::new();
        let buffer = Buffer::with_data(&gl, &[1u8, 2, 3, 4], StorageFlags::NONE).unwrap();

        match buffer.update(0, &[9, 9]) {
            Err(GlError::NotDynamic(handle)) => assert_eq!(handle, buffer.handle()),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(buffer.write(&0u32), Err(GlError::NotDynamic(_))));
        assert_eq!(gl.count_of("glNamedBufferSubData"), 0);
        assert_eq!(gl.buffer_contents(buffer.handle()), Some(vec![1, 2, 3, 4]));

        let mut back = [0u8; 4];
        buffer.read(0, &mut back).unwrap();
        assert_eq!(back, [1, 2, 3, 4]);
    }

    #[test]
    fn mismatched_or_empty_initial_data_is_rejected() {
        let gl = FakeGl::new();

        assert!(matches!(
            Buffer::new(&gl, 4, Some(&[1, 2]), StorageFlags::NONE),
            Err(GlError::SizeMismatch { expected: 4, actual: 2 })
        ));
        assert!(matches!(Buffer::new(&gl, 0, None, StorageFlags::NONE), Err(GlError::EmptyBuffer)));
        assert_eq!(gl.created(Kind::Buffer), 0);
    }

    #[test]
    fn bind_range_covers_the_whole_buffer() {
        let gl = FakeGl::new();
        let buffer = Buffer::for_value::<FrameBlock>(&gl, StorageFlags::DYNAMIC).unwrap();

        buffer.bind_range(BufferTarget::Uniform, 0);
        buffer.bind_base(BufferTarget::ShaderStorage, 1);

        assert_eq!(gl.binding(gl::UNIFORM_BUFFER, 0), Some((buffer.handle(), 0, buffer.size())));
        assert_eq!(gl.binding(gl::SHADER_STORAGE_BUFFER, 1), Some((buffer.handle(), 0, 0)));
    }

    #[test]
    fn drop_releases_each_buffer_once() {
        let gl = FakeGl::new();
        let (a, b) = {
            let a = Buffer::new(&gl, 4, None, StorageFlags::NONE).unwrap();
            let b = Buffer::new(&gl, 4, None, StorageFlags::NONE).unwrap();
            (a.handle(), b.handle())
        };

        // Locals drop in reverse declaration order
        assert_eq!(gl.deleted(Kind::Buffer), vec![b, a]);
        assert_eq!(gl.live_count(), 0);
    }

    #[test]
    fn flags_combine() {
        let flags = StorageFlags::DYNAMIC | StorageFlags::MAP_READ;
        assert!(flags.contains(StorageFlags::DYNAMIC));
        assert!(flags.contains(StorageFlags::MAP_READ));
        assert!(!flags.contains(StorageFlags::MAP_WRITE));
    }
}
