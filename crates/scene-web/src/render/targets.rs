//! Offscreen render targets: the full-resolution HDR scene texture and
//! the half-resolution bloom ping-pong pair.

pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

pub struct RenderTargets {
    pub hdr_view: wgpu::TextureView,
    pub bloom_a_view: wgpu::TextureView,
    pub bloom_b_view: wgpu::TextureView,
}

impl RenderTargets {
    pub fn create(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let hdr_view = make_target(device, "hdr_tex", width, height);
        let bloom_w = (width.max(1) / 2).max(1);
        let bloom_h = (height.max(1) / 2).max(1);
        let bloom_a_view = make_target(device, "bloom_a", bloom_w, bloom_h);
        let bloom_b_view = make_target(device, "bloom_b", bloom_w, bloom_h);
        Self {
            hdr_view,
            bloom_a_view,
            bloom_b_view,
        }
    }
}

fn make_target(device: &wgpu::Device, label: &str, width: u32, height: u32) -> wgpu::TextureView {
    let tex = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: HDR_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    tex.create_view(&wgpu::TextureViewDescriptor::default())
}
