//! Transform-ready buffers for the blur pipeline.
//!
//! One [`ChannelSet`] per color channel holds the forward input, the forward
//! half-spectrum, the multiplied half-spectrum fed to the inverse transform
//! and the inverse output. The kernel only needs the forward pair.
//!
//! Spatial inputs are filled from the source planes with
//! [`ChannelBuffers::fill_spatial`]. The blur harness calls it after building
//! the iteration's forward plans and before executing them.

use crate::OpsResult;
use crate::spectrum::multiply_spectra;
use fftb_core::{AlignedBuffer, RgbChannels, Shape};
use num_complex::Complex;
#[allow(unused_imports)]
use tracing::{debug, trace, warn};

/// Color channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Red
    Red,
    /// Green
    Green,
    /// Blue
    Blue,
}

impl Channel {
    /// All channels in RGB order.
    pub const ALL: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];

    /// Lowercase channel name.
    pub fn name(self) -> &'static str {
        match self {
            Channel::Red => "red",
            Channel::Green => "green",
            Channel::Blue => "blue",
        }
    }
}

/// Buffers of one color channel.
#[derive(Debug)]
pub struct ChannelSet {
    /// Forward input (real)
    pub spatial_in: AlignedBuffer<f64>,
    /// Forward output (half-spectrum)
    pub spectrum_out: AlignedBuffer<Complex<f64>>,
    /// Inverse input: `spectrum_out × kernel spectrum`
    pub spectrum_in: AlignedBuffer<Complex<f64>>,
    /// Inverse output (real, unnormalized)
    pub spatial_out: AlignedBuffer<f64>,
}

impl ChannelSet {
    fn allocate(prefix: &str, shape: &Shape, alignment: usize) -> OpsResult<Self> {
        Ok(Self {
            spatial_in: AlignedBuffer::zeroed(format!("{prefix}.spatial_in"), shape.len(), alignment)?,
            spectrum_out: AlignedBuffer::zeroed(
                format!("{prefix}.spectrum_out"),
                shape.spectrum_len(),
                alignment,
            )?,
            spectrum_in: AlignedBuffer::zeroed(
                format!("{prefix}.spectrum_in"),
                shape.spectrum_len(),
                alignment,
            )?,
            spatial_out: AlignedBuffer::zeroed(format!("{prefix}.spatial_out"), shape.len(), alignment)?,
        })
    }
}

/// Forward buffers of the kernel.
#[derive(Debug)]
pub struct KernelSet {
    /// Padded kernel (real)
    pub spatial_in: AlignedBuffer<f64>,
    /// Kernel half-spectrum
    pub spectrum_out: AlignedBuffer<Complex<f64>>,
}

/// All buffers of one blur run.
#[derive(Debug)]
pub struct ChannelBuffers {
    shape: Shape,
    /// Red channel
    pub red: ChannelSet,
    /// Green channel
    pub green: ChannelSet,
    /// Blue channel
    pub blue: ChannelSet,
    /// Kernel
    pub kernel: KernelSet,
}

impl ChannelBuffers {
    /// Allocates every buffer for a `shape` problem.
    ///
    /// # Errors
    ///
    /// The first allocation failure, naming the buffer
    /// (`fftb_core::Error::AllocationFailed`).
    pub fn allocate(shape: &Shape, alignment: usize) -> OpsResult<Self> {
        let buffers = Self {
            shape: shape.clone(),
            red: ChannelSet::allocate(Channel::Red.name(), shape, alignment)?,
            green: ChannelSet::allocate(Channel::Green.name(), shape, alignment)?,
            blue: ChannelSet::allocate(Channel::Blue.name(), shape, alignment)?,
            kernel: KernelSet {
                spatial_in: AlignedBuffer::zeroed("kernel.spatial_in", shape.len(), alignment)?,
                spectrum_out: AlignedBuffer::zeroed(
                    "kernel.spectrum_out",
                    shape.spectrum_len(),
                    alignment,
                )?,
            },
        };
        debug!(%shape, bytes = buffers.size_in_bytes(), "channel buffers allocated");
        Ok(buffers)
    }

    /// Problem shape.
    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Channel buffers by channel.
    pub fn channel_mut(&mut self, channel: Channel) -> &mut ChannelSet {
        match channel {
            Channel::Red => &mut self.red,
            Channel::Green => &mut self.green,
            Channel::Blue => &mut self.blue,
        }
    }

    /// Channel buffers by channel.
    pub fn channel(&self, channel: Channel) -> &ChannelSet {
        match channel {
            Channel::Red => &self.red,
            Channel::Green => &self.green,
            Channel::Blue => &self.blue,
        }
    }

    /// Total allocated bytes.
    pub fn size_in_bytes(&self) -> usize {
        let per_channel = |c: &ChannelSet| {
            c.spatial_in.size_in_bytes()
                + c.spectrum_out.size_in_bytes()
                + c.spectrum_in.size_in_bytes()
                + c.spatial_out.size_in_bytes()
        };
        per_channel(&self.red)
            + per_channel(&self.green)
            + per_channel(&self.blue)
            + self.kernel.spatial_in.size_in_bytes()
            + self.kernel.spectrum_out.size_in_bytes()
    }

    /// Names of buffers whose start is not on `boundary`; each one is
    /// reported with a warning.
    pub fn check_alignment(&self, boundary: usize) -> Vec<String> {
        let mut misaligned = Vec::new();
        let mut check = |name: &str, offset: usize| {
            if offset != 0 {
                warn!(buffer = name, offset, boundary, "buffer is not aligned, transforms may run slower");
                misaligned.push(name.to_string());
            }
        };
        for set in [&self.red, &self.green, &self.blue] {
            check(set.spatial_in.name(), set.spatial_in.misalignment(boundary));
            check(set.spectrum_out.name(), set.spectrum_out.misalignment(boundary));
            check(set.spectrum_in.name(), set.spectrum_in.misalignment(boundary));
            check(set.spatial_out.name(), set.spatial_out.misalignment(boundary));
        }
        check(self.kernel.spatial_in.name(), self.kernel.spatial_in.misalignment(boundary));
        check(self.kernel.spectrum_out.name(), self.kernel.spectrum_out.misalignment(boundary));
        misaligned
    }

    /// Multiplies the channel's forward spectrum with the kernel spectrum
    /// into the channel's inverse input.
    pub fn multiply(&mut self, channel: Channel) -> OpsResult<()> {
        let kernel = &self.kernel.spectrum_out;
        let set = match channel {
            Channel::Red => &mut self.red,
            Channel::Green => &mut self.green,
            Channel::Blue => &mut self.blue,
        };
        multiply_spectra(&set.spectrum_out, kernel, &mut set.spectrum_in)
    }

    /// Copies the source planes and the padded kernel into the forward inputs.
    pub fn fill_spatial(&mut self, image: &RgbChannels, padded_kernel: &[f64]) -> OpsResult<()> {
        self.red.spatial_in.fill_from(&image.red)?;
        self.green.spatial_in.fill_from(&image.green)?;
        self.blue.spatial_in.fill_from(&image.blue)?;
        self.kernel.spatial_in.fill_from(padded_kernel)?;
        Ok(())
    }
}
