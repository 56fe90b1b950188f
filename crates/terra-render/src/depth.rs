//! Per-frame render targets: a reverse-Z depth buffer and, when multisampling
//! is on, an MSAA color buffer that resolves into the swapchain image.

/// Depth buffer with reverse-Z configuration. Near maps to 1.0, far to 0.0.
pub struct DepthBuffer {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    width: u32,
    height: u32,
    sample_count: u32,
}

impl DepthBuffer {
    /// 32-bit float depth format for maximum precision with reverse-Z.
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Reverse-Z clear value: 0.0 represents the far plane.
    pub const CLEAR_VALUE: f32 = 0.0;

    /// Reverse-Z depth comparison: closer objects have higher depth values.
    pub const COMPARE_FUNCTION: wgpu::CompareFunction = wgpu::CompareFunction::GreaterEqual;

    pub fn new(device: &wgpu::Device, width: u32, height: u32, sample_count: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth-buffer"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            width,
            height,
            sample_count,
        }
    }

    /// Recreate the buffer at a new size. No-op if unchanged.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if self.width == width.max(1) && self.height == height.max(1) {
            return;
        }
        *self = Self::new(device, width, height, self.sample_count);
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }
}

/// Depth plus optional multisampled color, sized to the drawing buffer.
pub struct FrameTargets {
    pub depth: DepthBuffer,
    msaa: Option<(wgpu::Texture, wgpu::TextureView)>,
    format: wgpu::TextureFormat,
}

impl FrameTargets {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        sample_count: u32,
    ) -> Self {
        let sample_count = sample_count.max(1);
        Self {
            depth: DepthBuffer::new(device, width, height, sample_count),
            msaa: (sample_count > 1)
                .then(|| msaa_color(device, format, width, height, sample_count)),
            format,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if self.depth.width() == width.max(1) && self.depth.height() == height.max(1) {
            return;
        }
        *self = Self::new(device, self.format, width, height, self.sample_count());
    }

    pub fn sample_count(&self) -> u32 {
        self.depth.sample_count()
    }

    /// Color attachment for a pass drawing into `surface_view`: the MSAA
    /// buffer resolving into it, or the surface itself.
    pub fn color_attachment<'a>(
        &'a self,
        surface_view: &'a wgpu::TextureView,
        clear: wgpu::Color,
    ) -> wgpu::RenderPassColorAttachment<'a> {
        let (view, resolve_target, store) = match &self.msaa {
            Some((_, msaa_view)) => (msaa_view, Some(surface_view), wgpu::StoreOp::Discard),
            None => (surface_view, None, wgpu::StoreOp::Store),
        };
        wgpu::RenderPassColorAttachment {
            view,
            resolve_target,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(clear),
                store,
            },
            depth_slice: None,
        }
    }

    pub fn depth_attachment(&self) -> wgpu::RenderPassDepthStencilAttachment<'_> {
        wgpu::RenderPassDepthStencilAttachment {
            view: &self.depth.view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(DepthBuffer::CLEAR_VALUE),
                store: wgpu::StoreOp::Discard,
            }),
            stencil_ops: None,
        }
    }
}

fn msaa_color(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
    sample_count: u32,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("msaa-color"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::create_test_device_queue;

    #[test]
    fn test_depth_texture_format_is_depth32float() {
        assert_eq!(DepthBuffer::FORMAT, wgpu::TextureFormat::Depth32Float);
    }

    #[test]
    fn test_reverse_z_constants() {
        assert_eq!(DepthBuffer::CLEAR_VALUE, 0.0);
        assert_eq!(
            DepthBuffer::COMPARE_FUNCTION,
            wgpu::CompareFunction::GreaterEqual
        );
    }

    #[test]
    fn test_depth_resize_updates_dimensions() {
        let Some((device, _queue)) = create_test_device_queue() else {
            return;
        };
        let mut depth = DepthBuffer::new(&device, 800, 600, 1);
        depth.resize(&device, 1920, 1080);
        assert_eq!((depth.width(), depth.height()), (1920, 1080));
    }

    #[test]
    fn test_zero_size_is_clamped() {
        let Some((device, _queue)) = create_test_device_queue() else {
            return;
        };
        let depth = DepthBuffer::new(&device, 0, 0, 1);
        assert_eq!((depth.width(), depth.height()), (1, 1));
    }

    #[test]
    fn test_single_sample_targets_draw_to_surface() {
        let Some((device, _queue)) = create_test_device_queue() else {
            return;
        };
        let format = wgpu::TextureFormat::Rgba8UnormSrgb;
        let targets = FrameTargets::new(&device, format, 64, 32, 1);
        assert!(targets.msaa.is_none());

        let surface = device.create_texture(&wgpu::TextureDescriptor {
            label: None,
            size: wgpu::Extent3d {
                width: 64,
                height: 32,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = surface.create_view(&wgpu::TextureViewDescriptor::default());
        let attachment = targets.color_attachment(&view, wgpu::Color::WHITE);
        assert!(attachment.resolve_target.is_none());
    }

    #[test]
    fn test_msaa_targets_resize_together() {
        let Some((device, _queue)) = create_test_device_queue() else {
            return;
        };
        let mut targets =
            FrameTargets::new(&device, wgpu::TextureFormat::Rgba8UnormSrgb, 64, 32, 4);
        assert_eq!(targets.sample_count(), 4);
        targets.resize(&device, 128, 64);
        assert_eq!(targets.depth.width(), 128);
        assert_eq!(targets.sample_count(), 4);
        let (msaa, _) = targets.msaa.as_ref().unwrap();
        assert_eq!(msaa.width(), 128);
        assert_eq!(msaa.sample_count(), 4);
    }
}
