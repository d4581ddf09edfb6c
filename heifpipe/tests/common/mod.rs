//! In-memory stand-in for the codec library.
//!
//! Containers are stored on disk in a tiny binary format so the encode pipeline's
//! temp-file-and-rename path is exercised for real. Every object the fake hands out
//! is counted while alive, and any step can be made to fail.
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::fs;
use std::path::Path;
use std::rc::Rc;

use heifpipe::codec::{
    Codec, CodecResult, Container, DecodedImage, EncoderHandle, ImageHandle, WritableImage,
    Writer,
};
use heifpipe::{Chroma, CodecError, Colorspace, Compression, ItemId, Plane, PlaneMut};

const MAGIC: &[u8; 6] = b"FHEIF1";
/// Extra bytes appended to every plane row, filled with `PAD_BYTE`.
const ROW_PAD: usize = 5;
const PAD_BYTE: u8 = 0xEE;

/// Steps at which the fake can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    Open,
    Handle,
    Decode,
    DecodedPlane,
    ProfileRead,
    Writer,
    EncoderLookup,
    SetLossless,
    CreateImage,
    AddPlane,
    EncodePlane,
    ProfileAttach,
    Encode,
    Write,
}

/// One stored image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeImage {
    pub width: u32,
    pub height: u32,
    pub channels: usize,
    pub premultiplied: bool,
    pub profile: Vec<u8>,
    pub pixels: Vec<u8>,
}

impl FakeImage {
    pub fn new(width: u32, height: u32, channels: usize, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            channels,
            premultiplied: false,
            profile: Vec::new(),
            pixels,
        }
    }

    pub fn with_profile(mut self, profile: Vec<u8>) -> Self {
        self.profile = profile;
        self
    }

    pub fn premultiplied(mut self) -> Self {
        self.premultiplied = true;
        self
    }
}

pub fn write_container(path: &Path, images: &[FakeImage]) {
    let mut out = MAGIC.to_vec();
    out.extend_from_slice(&(images.len() as u32).to_le_bytes());
    for img in images {
        out.extend_from_slice(&img.width.to_le_bytes());
        out.extend_from_slice(&img.height.to_le_bytes());
        out.push(img.channels as u8);
        out.push(img.premultiplied as u8);
        out.extend_from_slice(&(img.profile.len() as u32).to_le_bytes());
        out.extend_from_slice(&img.profile);
        out.extend_from_slice(&img.pixels);
    }
    fs::write(path, out).expect("write fake container");
}

pub fn read_container(path: &Path) -> Option<Vec<FakeImage>> {
    let bytes = fs::read(path).ok()?;
    let mut cur = bytes.strip_prefix(MAGIC.as_slice())?;
    let mut take = |n: usize| -> Option<Vec<u8>> {
        if cur.len() < n {
            return None;
        }
        let (head, tail) = cur.split_at(n);
        cur = tail;
        Some(head.to_vec())
    };
    let u32_le = |b: Vec<u8>| u32::from_le_bytes(b.try_into().expect("4 bytes"));

    let count = u32_le(take(4)?);
    let mut images = Vec::new();
    for _ in 0..count {
        let width = u32_le(take(4)?);
        let height = u32_le(take(4)?);
        let flags = take(2)?;
        let profile_len = u32_le(take(4)?) as usize;
        let profile = take(profile_len)?;
        let channels = flags[0] as usize;
        let pixels = take(width as usize * height as usize * channels)?;
        images.push(FakeImage {
            width,
            height,
            channels,
            premultiplied: flags[1] != 0,
            profile,
            pixels,
        });
    }
    Some(images)
}

/// Shared bookkeeping: failure injection, live object counts, release log.
#[derive(Debug, Default)]
pub struct Tracker {
    fail_at: Cell<Option<FailAt>>,
    live: Cell<isize>,
    acquired: Cell<usize>,
    released: RefCell<Vec<&'static str>>,
    last_chroma: Cell<Option<Chroma>>,
    encoded_profile: RefCell<Option<Vec<u8>>>,
}

impl Tracker {
    fn fail(&self, at: FailAt) -> CodecResult<()> {
        if self.fail_at.get() == Some(at) {
            Err(CodecError::new(99, 0, format!("injected failure at {:?}", at)))
        } else {
            Ok(())
        }
    }

    fn acquire(self: &Rc<Self>, kind: &'static str) -> Guard {
        self.live.set(self.live.get() + 1);
        self.acquired.set(self.acquired.get() + 1);
        Guard {
            kind,
            tracker: Rc::clone(self),
        }
    }
}

/// Counted stand-in for one codec-owned object.
#[derive(Debug)]
pub struct Guard {
    kind: &'static str,
    tracker: Rc<Tracker>,
}

impl Drop for Guard {
    fn drop(&mut self) {
        self.tracker.live.set(self.tracker.live.get() - 1);
        self.tracker.released.borrow_mut().push(self.kind);
    }
}

#[derive(Debug, Default, Clone)]
pub struct FakeCodec {
    tracker: Rc<Tracker>,
}

impl FakeCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_at(at: FailAt) -> Self {
        let codec = Self::default();
        codec.tracker.fail_at.set(Some(at));
        codec
    }

    pub fn live(&self) -> isize {
        self.tracker.live.get()
    }

    pub fn acquired(&self) -> usize {
        self.tracker.acquired.get()
    }

    pub fn released(&self) -> Vec<&'static str> {
        self.tracker.released.borrow().clone()
    }

    pub fn clear_log(&self) {
        self.tracker.released.borrow_mut().clear();
    }

    pub fn last_decode_chroma(&self) -> Option<Chroma> {
        self.tracker.last_chroma.get()
    }

    /// Profile bytes that were attached to the image at the moment it was encoded.
    pub fn profile_at_encode(&self) -> Option<Vec<u8>> {
        self.tracker.encoded_profile.borrow().clone()
    }
}

impl Codec for FakeCodec {
    type Container<'a> = FakeContainer;
    type Writer<'a> = FakeWriter;

    fn open(&self, path: &Path) -> CodecResult<FakeContainer> {
        self.tracker.fail(FailAt::Open)?;
        let images = read_container(path)
            .ok_or_else(|| CodecError::new(2, 0, format!("cannot read {}", path.display())))?;
        Ok(FakeContainer {
            images,
            tracker: Rc::clone(&self.tracker),
            _guard: self.tracker.acquire("container"),
        })
    }

    fn writer(&self) -> CodecResult<FakeWriter> {
        self.tracker.fail(FailAt::Writer)?;
        Ok(FakeWriter {
            encoded: Vec::new(),
            tracker: Rc::clone(&self.tracker),
            _guard: self.tracker.acquire("writer"),
        })
    }
}

pub struct FakeContainer {
    images: Vec<FakeImage>,
    tracker: Rc<Tracker>,
    _guard: Guard,
}

impl Container for FakeContainer {
    type Handle = FakeHandle;

    fn top_level_image_ids(&self) -> Vec<ItemId> {
        (1..=self.images.len() as ItemId).collect()
    }

    fn image_handle(&self, id: ItemId) -> CodecResult<FakeHandle> {
        self.tracker.fail(FailAt::Handle)?;
        let image = self
            .images
            .get(id as usize - 1)
            .cloned()
            .ok_or_else(|| CodecError::new(3, 0, "no such item"))?;
        Ok(FakeHandle {
            image,
            tracker: Rc::clone(&self.tracker),
            _guard: self.tracker.acquire("handle"),
        })
    }
}

pub struct FakeHandle {
    image: FakeImage,
    tracker: Rc<Tracker>,
    _guard: Guard,
}

impl ImageHandle for FakeHandle {
    type Image = FakeDecoded;

    fn width(&self) -> u32 {
        self.image.width
    }

    fn height(&self) -> u32 {
        self.image.height
    }

    fn has_alpha(&self) -> bool {
        self.image.channels == 4
    }

    fn is_premultiplied_alpha(&self) -> bool {
        self.image.premultiplied
    }

    fn raw_color_profile_size(&self) -> usize {
        self.image.profile.len()
    }

    fn raw_color_profile(&self) -> CodecResult<Vec<u8>> {
        self.tracker.fail(FailAt::ProfileRead)?;
        Ok(self.image.profile.clone())
    }

    fn decode(&self, colorspace: Colorspace, chroma: Chroma) -> CodecResult<FakeDecoded> {
        assert_eq!(colorspace, Colorspace::Rgb);
        self.tracker.fail(FailAt::Decode)?;
        self.tracker.last_chroma.set(Some(chroma));
        if chroma.channels() != self.image.channels {
            return Err(CodecError::new(4, 0, "unsupported chroma for this image"));
        }

        // Widen to 16-bit BE samples for the wide layout, then pad each row.
        let samples: Vec<u8> = match chroma.bytes_per_sample() {
            1 => self.image.pixels.clone(),
            _ => self
                .image
                .pixels
                .iter()
                .flat_map(|&v| (v as u16).to_be_bytes())
                .collect(),
        };
        let row_bytes =
            self.image.width as usize * self.image.channels * chroma.bytes_per_sample();
        let stride = row_bytes + ROW_PAD;
        let mut data = Vec::with_capacity(stride * self.image.height as usize);
        for row in samples.chunks_exact(row_bytes) {
            data.extend_from_slice(row);
            data.extend_from_slice(&[PAD_BYTE; ROW_PAD]);
        }

        let null_plane = self.tracker.fail(FailAt::DecodedPlane).is_err();
        Ok(FakeDecoded {
            data,
            stride,
            null_plane,
            _guard: self.tracker.acquire("decoded image"),
        })
    }
}

pub struct FakeDecoded {
    data: Vec<u8>,
    stride: usize,
    null_plane: bool,
    _guard: Guard,
}

impl DecodedImage for FakeDecoded {
    fn plane(&self) -> Option<Plane<'_>> {
        (!self.null_plane).then_some(Plane {
            data: &self.data,
            stride: self.stride,
        })
    }

    fn bits_per_sample(&self) -> u32 {
        8
    }
}

pub struct FakeEncoder {
    lossless: bool,
    tracker: Rc<Tracker>,
    _guard: Guard,
}

impl EncoderHandle for FakeEncoder {
    fn set_lossless(&mut self, enable: bool) -> CodecResult<()> {
        self.tracker.fail(FailAt::SetLossless)?;
        self.lossless = enable;
        Ok(())
    }
}

pub struct FakeWritable {
    width: u32,
    height: u32,
    chroma: Chroma,
    stride: usize,
    plane: Option<Vec<u8>>,
    profile: Option<Vec<u8>>,
    tracker: Rc<Tracker>,
    _guard: Guard,
}

impl WritableImage for FakeWritable {
    fn add_plane(&mut self, width: u32, height: u32, bits_per_pixel: u32) -> CodecResult<()> {
        self.tracker.fail(FailAt::AddPlane)?;
        assert_eq!((width, height), (self.width, self.height));
        assert_eq!(bits_per_pixel as usize, self.chroma.channels() * 8);
        // Round rows up to 16 bytes like an aligning allocator would.
        self.stride = (width as usize * self.chroma.channels()).div_ceil(16) * 16;
        self.plane = Some(vec![PAD_BYTE; self.stride * height as usize]);
        Ok(())
    }

    fn plane_mut(&mut self) -> Option<PlaneMut<'_>> {
        if self.tracker.fail(FailAt::EncodePlane).is_err() {
            return None;
        }
        let stride = self.stride;
        self.plane.as_mut().map(|data| PlaneMut {
            data: data.as_mut_slice(),
            stride,
        })
    }

    fn set_raw_color_profile(&mut self, tag: &[u8; 4], bytes: &[u8]) -> CodecResult<()> {
        self.tracker.fail(FailAt::ProfileAttach)?;
        assert_eq!(tag, b"rICC");
        self.profile = Some(bytes.to_vec());
        Ok(())
    }
}

pub struct FakeWriter {
    encoded: Vec<FakeImage>,
    tracker: Rc<Tracker>,
    _guard: Guard,
}

impl Writer for FakeWriter {
    type Encoder = FakeEncoder;
    type Image = FakeWritable;
    type Encoded = Guard;

    fn encoder_for(&self, compression: Compression) -> CodecResult<FakeEncoder> {
        assert_eq!(compression, Compression::Hevc);
        self.tracker.fail(FailAt::EncoderLookup)?;
        Ok(FakeEncoder {
            lossless: false,
            tracker: Rc::clone(&self.tracker),
            _guard: self.tracker.acquire("encoder"),
        })
    }

    fn create_image(
        &self,
        width: u32,
        height: u32,
        colorspace: Colorspace,
        chroma: Chroma,
    ) -> CodecResult<FakeWritable> {
        assert_eq!(colorspace, Colorspace::Rgb);
        self.tracker.fail(FailAt::CreateImage)?;
        Ok(FakeWritable {
            width,
            height,
            chroma,
            stride: 0,
            plane: None,
            profile: None,
            tracker: Rc::clone(&self.tracker),
            _guard: self.tracker.acquire("image"),
        })
    }

    fn encode(&mut self, image: &FakeWritable, encoder: &mut FakeEncoder) -> CodecResult<Guard> {
        self.tracker.fail(FailAt::Encode)?;
        if !encoder.lossless {
            return Err(CodecError::new(5, 0, "fake codec only encodes losslessly"));
        }
        let plane = image
            .plane
            .as_ref()
            .ok_or_else(|| CodecError::new(5, 1, "image has no plane"))?;
        let row_bytes = image.width as usize * image.chroma.channels();
        let pixels = plane
            .chunks(image.stride)
            .flat_map(|row| row[..row_bytes].to_vec())
            .collect();
        *self.tracker.encoded_profile.borrow_mut() = image.profile.clone();
        self.encoded.push(FakeImage {
            width: image.width,
            height: image.height,
            channels: image.chroma.channels(),
            premultiplied: false,
            profile: image.profile.clone().unwrap_or_default(),
            pixels,
        });
        Ok(self.tracker.acquire("encoded handle"))
    }

    fn write_to_file(&self, path: &Path) -> CodecResult<()> {
        self.tracker.fail(FailAt::Write)?;
        write_container(path, &self.encoded);
        Ok(())
    }
}
