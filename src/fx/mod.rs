//! Delay memory and accumulator context shared by the delay-network effects.
//!
//! A [`DelayMemory`] is one contiguous buffer partitioned once into named
//! delay lines. Each line keeps its own circular cursor; lines are never
//! resized after construction. Audio is pushed through the lines with an
//! [`FxContext`], a single-sample accumulator chaining reads, writes and
//! filters.

// Based on MIT-licensed code (c) 2014 by Olivier Gillet (ol.gillet@gmail.com)

pub mod resonator;

use core::fmt::Debug;
use core::marker::PhantomData;

use crate::error::Error;
use crate::utils::clip_16;

/// Extra slots per line so a Hermite read at the full line length never wraps
/// onto the sample written in the same frame.
pub const LINE_GUARD: usize = 3;

/// Storage format of the samples held in a [`DelayMemory`].
pub trait DataType {
    type Sample: Copy + Default + Debug;

    fn compress(value: f32) -> Self::Sample;

    fn decompress(sample: Self::Sample) -> f32;
}

/// Samples stored as 12-bit fixed point in an `i16`, saturated to 16 bits.
#[derive(Debug, Default)]
pub struct DataFormat12Bit;

/// Samples stored as plain `f32`.
#[derive(Debug, Default)]
pub struct DataFormat32Bit;

impl DataType for DataFormat12Bit {
    type Sample = i16;

    #[inline]
    fn compress(value: f32) -> i16 {
        clip_16((value * 4096.0) as i32) as i16
    }

    #[inline]
    fn decompress(sample: i16) -> f32 {
        sample as f32 / 4096.0
    }
}

impl DataType for DataFormat32Bit {
    type Sample = f32;

    #[inline]
    fn compress(value: f32) -> f32 {
        value
    }

    #[inline]
    fn decompress(sample: f32) -> f32 {
        sample
    }
}

/// Placement of one delay line inside the memory.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Index of the first slot of the line.
    pub base: usize,
    /// Longest delay that can be read from the line, in samples.
    pub length: usize,
}

impl Region {
    /// Number of slots occupied by the line.
    #[inline]
    pub const fn storage(&self) -> usize {
        self.length + LINE_GUARD
    }
}

/// Number of samples needed to hold delay lines of the given lengths.
pub const fn required_size(lengths: &[usize]) -> usize {
    let mut size = 0;
    let mut i = 0;
    while i < lengths.len() {
        size += lengths[i] + LINE_GUARD;
        i += 1;
    }
    size
}

/// Lays out delay lines back to back, in the order given.
pub const fn partition<const LINES: usize>(lengths: [usize; LINES]) -> [Region; LINES] {
    let mut regions = [Region { base: 0, length: 0 }; LINES];
    let mut base = 0;
    let mut i = 0;
    while i < LINES {
        regions[i] = Region {
            base,
            length: lengths[i],
        };
        base += lengths[i] + LINE_GUARD;
        i += 1;
    }
    regions
}

#[derive(Debug)]
pub struct DelayMemory<const SIZE: usize, const LINES: usize, DT>
where
    DT: DataType,
{
    buffer: [DT::Sample; SIZE],
    regions: [Region; LINES],
    cursors: [usize; LINES],
    _data_type: PhantomData<DT>,
}

impl<const SIZE: usize, const LINES: usize, DT> DelayMemory<SIZE, LINES, DT>
where
    DT: DataType,
{
    /// Partitions the memory into lines of the given lengths.
    pub fn new(lengths: [usize; LINES]) -> Result<Self, Error> {
        let requested = required_size(&lengths);
        if requested > SIZE {
            return Err(Error::DelayMemoryExhausted {
                requested,
                capacity: SIZE,
            });
        }

        Ok(Self {
            buffer: [DT::Sample::default(); SIZE],
            regions: partition(lengths),
            cursors: [0; LINES],
            _data_type: PhantomData,
        })
    }

    pub fn clear(&mut self) {
        self.buffer.fill(DT::Sample::default());
        self.cursors.fill(0);
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        SIZE
    }

    #[inline]
    pub fn region(&self, line: usize) -> Region {
        self.regions[line]
    }

    #[inline]
    pub fn length(&self, line: usize) -> usize {
        self.regions[line].length
    }

    /// Advances every line by one sample and clears the accumulator.
    #[inline]
    pub fn start(&mut self, c: &mut FxContext) {
        for (cursor, region) in self.cursors.iter_mut().zip(self.regions.iter()) {
            *cursor = if *cursor == 0 {
                region.storage() - 1
            } else {
                *cursor - 1
            };
        }

        c.accumulator = 0.0;
        c.previous_read = 0.0;
    }

    #[inline]
    fn index(&self, line: usize, offset: usize) -> usize {
        let region = &self.regions[line];
        let index = region.base + (self.cursors[line] + offset) % region.storage();
        debug_assert!(index < region.base + region.storage());
        index
    }

    /// Sample written `offset` frames ago. An offset of 0 returns the sample
    /// written during the current frame.
    #[inline]
    pub fn read(&self, line: usize, offset: usize) -> f32 {
        DT::decompress(self.buffer[self.index(line, offset)])
    }

    /// Cubic (Hermite) interpolated read at a fractional delay.
    #[inline]
    pub fn read_hermite(&self, line: usize, delay: f32) -> f32 {
        let delay = delay.max(0.0);
        let delay_integral = delay as usize;
        let delay_fractional = delay - (delay_integral as f32);
        let storage = self.regions[line].storage();
        let t = delay_integral + storage;

        let xm1 = self.read(line, t - 1);
        let x0 = self.read(line, t);
        let x1 = self.read(line, t + 1);
        let x2 = self.read(line, t + 2);
        let c = (x1 - xm1) * 0.5;
        let v = x0 - x1;
        let w = c + v;
        let a = w + v + (x2 - x0) * 0.5;
        let b_neg = w + a;
        let f = delay_fractional;

        (((a * f) - b_neg) * f + c) * f + x0
    }

    #[inline]
    pub fn write(&mut self, line: usize, value: f32) {
        let index = self.index(line, 0);
        self.buffer[index] = DT::compress(value);
    }
}

/// Single-sample accumulator used to chain delay-line operations.
#[derive(Debug, Default)]
pub struct FxContext {
    accumulator: f32,
    previous_read: f32,
}

impl FxContext {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    #[inline]
    pub fn previous_read(&self) -> f32 {
        self.previous_read
    }

    #[inline]
    pub fn load(&mut self, value: f32) {
        self.accumulator = value;
    }

    #[inline]
    pub fn read(&mut self, value: f32, scale: f32) {
        self.accumulator += value * scale;
    }

    #[inline]
    pub fn read_line<const SIZE: usize, const LINES: usize, DT: DataType>(
        &mut self,
        memory: &DelayMemory<SIZE, LINES, DT>,
        line: usize,
        offset: usize,
        scale: f32,
    ) {
        let r = memory.read(line, offset);
        self.previous_read = r;
        self.accumulator += r * scale;
    }

    #[inline]
    pub fn interpolate_hermite<const SIZE: usize, const LINES: usize, DT: DataType>(
        &mut self,
        memory: &DelayMemory<SIZE, LINES, DT>,
        line: usize,
        delay: f32,
        scale: f32,
    ) {
        let r = memory.read_hermite(line, delay);
        self.previous_read = r;
        self.accumulator += r * scale;
    }

    #[inline]
    pub fn write_line<const SIZE: usize, const LINES: usize, DT: DataType>(
        &mut self,
        memory: &mut DelayMemory<SIZE, LINES, DT>,
        line: usize,
        scale: f32,
    ) {
        memory.write(line, self.accumulator);
        self.accumulator *= scale;
    }

    #[inline]
    pub fn write(&mut self, value: &mut f32, scale: f32) {
        *value = self.accumulator;
        self.accumulator *= scale;
    }

    #[inline]
    pub fn lp(&mut self, state: &mut f32, coefficient: f32) {
        *state += coefficient * (self.accumulator - *state);
        self.accumulator = *state;
    }
}
