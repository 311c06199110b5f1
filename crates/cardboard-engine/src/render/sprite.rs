use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::coords::PixelRect;
use crate::paint::Color;
use crate::raster::CoverageMask;
use crate::render::{RenderCtx, RenderTarget};

use super::common::{
    clamp_to_surface, min_binding_size, premul_alpha_blend, QuadVertex, QUAD_INDICES,
    QUAD_VERTICES,
};

/// Caller-chosen identifier for an uploaded coverage mask.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

/// One textured quad.
///
/// `model` maps the unit quad (`[0, 1]²` in the local XY plane, +Y up) into
/// world space. The mask is stretched over the whole quad with its first row
/// at local `y = 1`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SpriteDraw {
    pub texture: TextureId,
    pub model: Mat4,
    /// Premultiplied color multiplied by mask coverage.
    pub tint: Color,
}

/// One view of the scene: a camera and the surface rect it draws into.
///
/// Viewport and scissor are both set to `rect`, so nothing a view draws can
/// leak into a neighbouring view.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewPass {
    pub rect: PixelRect,
    pub view_proj: Mat4,
}

struct GpuMask {
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

struct ViewBinding {
    ubo: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Renderer for world-space sprites.
///
/// Draws are issued in the order given; callers sort back-to-front. There is
/// no depth buffer, so overlapping sprites composite purely by order.
///
/// Every view in a `render` call shares one render pass and one instance
/// buffer upload; only the camera binding, viewport and scissor change
/// between views.
#[derive(Default)]
pub struct SpriteRenderer {
    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,
    camera_bgl: Option<wgpu::BindGroupLayout>,
    mask_bgl: Option<wgpu::BindGroupLayout>,
    sampler: Option<wgpu::Sampler>,

    views: Vec<ViewBinding>,
    masks: HashMap<TextureId, GpuMask>,

    quad_vbo: Option<wgpu::Buffer>,
    quad_ibo: Option<wgpu::Buffer>,
    instance_vbo: Option<wgpu::Buffer>,
    instance_capacity: usize,

    warned_missing: bool,
}

impl SpriteRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploads `mask` under `id`. Uploading an id twice keeps the first mask.
    pub fn upload_mask(&mut self, ctx: &RenderCtx<'_>, id: TextureId, mask: &CoverageMask) {
        if self.masks.contains_key(&id) {
            return;
        }
        if mask.is_empty() {
            log::debug!("SpriteRenderer: skipping empty mask {id:?}");
            return;
        }

        self.ensure_pipeline(ctx);
        self.ensure_sampler(ctx);
        let Some(bgl) = self.mask_bgl.as_ref() else { return };
        let Some(sampler) = self.sampler.as_ref() else { return };

        let size = wgpu::Extent3d {
            width: mask.width(),
            height: mask.height(),
            depth_or_array_layers: 1,
        };

        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("cardboard sprite mask"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        ctx.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            mask.data(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(mask.width()),
                rows_per_image: Some(mask.height()),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("cardboard sprite mask bind group"),
            layout: bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        log::debug!("SpriteRenderer: uploaded {id:?} ({}×{})", mask.width(), mask.height());
        self.masks.insert(id, GpuMask { _texture: texture, bind_group });
    }

    /// Draws `draws` once per entry in `views`, each clipped to its rect.
    ///
    /// Draws referencing a texture that was never uploaded are skipped.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        views: &[ViewPass],
        draws: &[SpriteDraw],
    ) {
        self.ensure_pipeline(ctx);
        self.ensure_sampler(ctx);
        self.ensure_static_buffers(ctx);

        let instances: Vec<(TextureId, SpriteInstance)> = draws
            .iter()
            .filter(|d| {
                let known = self.masks.contains_key(&d.texture);
                if !known && !self.warned_missing {
                    log::debug!("SpriteRenderer: draw references unknown {:?}; skipped", d.texture);
                    self.warned_missing = true;
                }
                known
            })
            .map(|d| (d.texture, SpriteInstance::new(d)))
            .collect();

        if instances.is_empty() || views.is_empty() {
            return;
        }

        // Mutating methods must happen before borrowing pipeline/buffers immutably.
        self.ensure_view_bindings(ctx, views.len());
        self.ensure_instance_capacity(ctx, instances.len());

        for (binding, view) in self.views.iter().zip(views) {
            let u = CameraUniform { view_proj: view.view_proj.to_cols_array_2d() };
            ctx.queue.write_buffer(&binding.ubo, 0, bytemuck::bytes_of(&u));
        }

        let Some(instance_vbo) = self.instance_vbo.as_ref() else { return };
        let raw: Vec<SpriteInstance> = instances.iter().map(|(_, inst)| *inst).collect();
        ctx.queue.write_buffer(instance_vbo, 0, bytemuck::cast_slice(&raw));

        let Some(pipeline) = self.pipeline.as_ref() else { return };
        let Some(quad_vbo) = self.quad_vbo.as_ref() else { return };
        let Some(quad_ibo) = self.quad_ibo.as_ref() else { return };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("cardboard sprite pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(pipeline);
        rpass.set_vertex_buffer(0, quad_vbo.slice(..));
        rpass.set_vertex_buffer(1, instance_vbo.slice(..));
        rpass.set_index_buffer(quad_ibo.slice(..), wgpu::IndexFormat::Uint16);

        for (binding, view) in self.views.iter().zip(views) {
            let Some(rect) = clamp_to_surface(view.rect, ctx.surface_size) else { continue };

            rpass.set_viewport(
                rect.x as f32,
                rect.y as f32,
                rect.width as f32,
                rect.height as f32,
                0.0,
                1.0,
            );
            rpass.set_scissor_rect(rect.x, rect.y, rect.width, rect.height);
            rpass.set_bind_group(0, &binding.bind_group, &[]);

            // One instanced call per consecutive run sharing a texture.
            let mut i = 0usize;
            while i < instances.len() {
                let texture = instances[i].0;
                let mut j = i + 1;
                while j < instances.len() && instances[j].0 == texture {
                    j += 1;
                }
                if let Some(mask) = self.masks.get(&texture) {
                    rpass.set_bind_group(1, &mask.bind_group, &[]);
                    rpass.draw_indexed(0..6, 0, i as u32..j as u32);
                }
                i = j;
            }
        }
    }

    // ── lazy-init helpers ──────────────────────────────────────────────────

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.surface_format) && self.pipeline.is_some() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("cardboard sprite shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/sprite.wgsl").into()),
        });

        let camera_bgl = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("cardboard sprite camera bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: Some(min_binding_size::<CameraUniform>()),
                },
                count: None,
            }],
        });

        let mask_bgl = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("cardboard sprite mask bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("cardboard sprite pipeline layout"),
            bind_group_layouts: &[&camera_bgl, &mask_bgl],
            immediate_size: 0,
        });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("cardboard sprite pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[QuadVertex::layout(), SpriteInstance::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: Some(premul_alpha_blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Sprites are double-sided; mirrored models flip the winding.
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        self.pipeline_format = Some(ctx.surface_format);
        self.pipeline = Some(pipeline);

        // Layouts changed: every bind group built against the old ones is stale.
        if self.camera_bgl.is_some() || self.mask_bgl.is_some() {
            self.views.clear();
            if !self.masks.is_empty() {
                log::warn!(
                    "SpriteRenderer: surface format changed; dropping {} uploaded masks",
                    self.masks.len()
                );
                self.masks.clear();
            }
        }
        self.camera_bgl = Some(camera_bgl);
        self.mask_bgl = Some(mask_bgl);
    }

    fn ensure_sampler(&mut self, ctx: &RenderCtx<'_>) {
        if self.sampler.is_some() {
            return;
        }
        self.sampler = Some(ctx.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("cardboard sprite sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        }));
    }

    fn ensure_view_bindings(&mut self, ctx: &RenderCtx<'_>, count: usize) {
        let Some(bgl) = self.camera_bgl.as_ref() else { return };

        while self.views.len() < count {
            let ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("cardboard sprite camera ubo"),
                size: std::mem::size_of::<CameraUniform>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });

            let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("cardboard sprite camera bind group"),
                layout: bgl,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: ubo.as_entire_binding(),
                }],
            });

            self.views.push(ViewBinding { ubo, bind_group });
        }
    }

    fn ensure_static_buffers(&mut self, ctx: &RenderCtx<'_>) {
        if self.quad_vbo.is_some() && self.quad_ibo.is_some() {
            return;
        }

        self.quad_vbo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cardboard sprite quad vbo"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        }));

        self.quad_ibo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cardboard sprite quad ibo"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        }));
    }

    fn ensure_instance_capacity(&mut self, ctx: &RenderCtx<'_>, required: usize) {
        if required <= self.instance_capacity && self.instance_vbo.is_some() {
            return;
        }

        let new_cap = required.next_power_of_two().max(16);
        let new_size = (new_cap * std::mem::size_of::<SpriteInstance>()) as u64;

        self.instance_vbo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("cardboard sprite instance vbo"),
            size: new_size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.instance_capacity = new_cap;
    }
}

// ── GPU types ─────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct CameraUniform {
    view_proj: [[f32; 4]; 4],
}

/// Instance data layout (80 bytes):
///
///  offset  0  model   [[f32; 4]; 4]   loc 1..=4 (columns)
///  offset 64  tint    [f32; 4]        loc 5
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct SpriteInstance {
    model: [[f32; 4]; 4],
    tint: [f32; 4],
}

impl SpriteInstance {
    const ATTRS: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        1 => Float32x4, // model column 0
        2 => Float32x4, // model column 1
        3 => Float32x4, // model column 2
        4 => Float32x4, // model column 3
        5 => Float32x4  // tint
    ];

    fn new(draw: &SpriteDraw) -> Self {
        Self {
            model: draw.model.to_cols_array_2d(),
            tint: draw.tint.to_array(),
        }
    }

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SpriteInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_layout_matches_attribute_offsets() {
        assert_eq!(std::mem::size_of::<SpriteInstance>(), 80);
        let layout = SpriteInstance::layout();
        assert_eq!(layout.array_stride, 80);
        assert_eq!(layout.attributes.last().map(|a| a.offset), Some(64));
    }

    #[test]
    fn instance_keeps_column_major_model() {
        let model = Mat4::from_translation(glam::Vec3::new(1.0, 2.0, 3.0));
        let inst = SpriteInstance::new(&SpriteDraw {
            texture: TextureId(0),
            model,
            tint: Color::WHITE,
        });
        assert_eq!(inst.model[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(inst.tint, [1.0; 4]);
    }
}
