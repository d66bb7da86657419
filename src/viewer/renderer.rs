//! wgpu point-cloud renderer for trail buffers.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use rand::Rng;
use tracing::{debug, info};
use wgpu::util::DeviceExt;
use winit::window::Window;

use super::camera::Camera;
use crate::config::VisualsConfig;
use crate::error::ViewerError;
use crate::store::TrailStore;

const SHADER_SOURCE: &str = include_str!("points.wgsl");

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    color: [f32; 4],
    offset: [f32; 4],
    viewport: [f32; 2],
    trail_length: u32,
    valid_len: u32,
}

/// Bytes per trail sample on the GPU (`vec4<f32>`).
const SAMPLE_STRIDE: usize = 16;

/// Trail storage sizing, validated against the device limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TrailCapacity {
    instances: u32,
    trail_length: u32,
    bytes: u64,
}

impl TrailCapacity {
    fn check(
        particle_count: usize,
        trail_length: usize,
        limits: &wgpu::Limits,
    ) -> Result<Self, ViewerError> {
        let overflow = || ViewerError::SampleCountOverflow {
            particles: particle_count,
            trail_length,
        };

        let trail_length_u32 = u32::try_from(trail_length).map_err(|_| overflow())?;
        let instances = u32::try_from(particle_count)
            .ok()
            .and_then(|n| n.checked_mul(trail_length_u32))
            .ok_or_else(overflow)?;

        // The buffer always holds at least one row so the binding is never empty.
        let bytes = u64::from(instances.max(trail_length_u32).max(1)) * SAMPLE_STRIDE as u64;

        let limit = (limits.max_storage_buffer_binding_size as u64).min(limits.max_buffer_size);
        if bytes > limit {
            return Err(ViewerError::TrailBufferTooLarge { bytes, limit });
        }

        Ok(Self {
            instances,
            trail_length: trail_length_u32,
            bytes,
        })
    }
}

/// GPU resources for drawing every particle's trail as points.
pub struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    render_pipeline: wgpu::RenderPipeline,
    trail_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    visuals: VisualsConfig,
    /// One instance per trail sample.
    instance_count: u32,
    trail_length: u32,
    /// Scratch space for one particle's f32 samples.
    staging: Vec<[f32; 4]>,
}

impl GpuState {
    pub async fn new(
        window: Arc<Window>,
        visuals: VisualsConfig,
        particle_count: usize,
        trail_length: usize,
    ) -> Result<Self, ViewerError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(ViewerError::NoAdapter)?;

        let adapter_info = adapter.get_info();
        info!(name = %adapter_info.name, backend = ?adapter_info.backend, "selected GPU adapter");

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let capacity = TrailCapacity::check(particle_count, trail_length, &device.limits())?;
        let trail_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Trail Buffer"),
            size: capacity.bytes,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniform Buffer"),
            contents: bytemuck::bytes_of(&Uniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Points Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Points Bind Group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: trail_buffer.as_entire_binding(),
                },
            ],
        });

        let render_pipeline = create_render_pipeline(&device, &bind_group_layout, surface_format);

        debug!(
            instances = capacity.instances,
            bytes = capacity.bytes,
            format = ?surface_format,
            "created point renderer"
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            render_pipeline,
            trail_buffer,
            uniform_buffer,
            bind_group,
            visuals,
            instance_count: capacity.instances,
            trail_length: capacity.trail_length,
            staging: vec![[0.0; 4]; trail_length],
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            debug!(width = new_size.width, height = new_size.height, "resized surface");
        }
    }

    /// Copy every dirty trail to the GPU and clear its flag.
    ///
    /// Must be called after the frame's `tick()` has returned.
    pub fn upload<R: Rng>(&mut self, store: &mut TrailStore<R>) {
        let dirty: Vec<usize> = store.dirty_particles().collect();
        let row_bytes = self.trail_length as usize * SAMPLE_STRIDE;

        for &index in &dirty {
            let Ok(trail) = store.trail(index) else {
                continue;
            };
            for (dst, src) in self.staging.iter_mut().zip(trail.samples()) {
                *dst = [src.x as f32, src.y as f32, src.z as f32, 1.0];
            }
            self.queue.write_buffer(
                &self.trail_buffer,
                (index * row_bytes) as u64,
                bytemuck::cast_slice(&self.staging),
            );
        }

        store.clear_all_dirty();
    }

    fn update_uniforms(&mut self, camera: &Camera, valid_len: usize) {
        let aspect = self.config.width as f32 / self.config.height as f32;
        let [r, g, b] = self.visuals.color;
        let [ox, oy, oz] = self.visuals.offset;

        let uniforms = Uniforms {
            view_proj: camera.view_proj(aspect).to_cols_array_2d(),
            color: [r, g, b, self.visuals.opacity],
            offset: [ox, oy, oz, self.visuals.point_size],
            viewport: [self.config.width as f32, self.config.height as f32],
            trail_length: self.trail_length,
            valid_len: valid_len as u32,
        };
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    pub fn render(&mut self, camera: &Camera, valid_len: usize) -> Result<(), wgpu::SurfaceError> {
        self.update_uniforms(camera, valid_len);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let [r, g, b] = self.visuals.background;
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.render_pipeline);
            render_pass.set_bind_group(0, &self.bind_group, &[]);
            render_pass.draw(0..6, 0..self.instance_count);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn create_render_pipeline(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    surface_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Points Shader"),
        source: wgpu::ShaderSource::Wgsl(SHADER_SOURCE.into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Points Pipeline Layout"),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Points Pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        // Points neither test nor write depth; overlap accumulates through blending.
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_default_swarm_fits() {
        let capacity = TrailCapacity::check(500, 1000, &wgpu::Limits::default()).unwrap();
        assert_eq!(capacity.instances, 500_000);
        assert_eq!(capacity.trail_length, 1000);
        assert_eq!(capacity.bytes, 500_000 * 16);
    }

    #[test]
    fn test_capacity_rejects_oversized_buffer() {
        let limits = wgpu::Limits::default();
        let err = TrailCapacity::check(10_000, 1000, &limits).unwrap_err();
        match err {
            ViewerError::TrailBufferTooLarge { bytes, limit } => {
                assert_eq!(bytes, 160_000_000);
                assert_eq!(limit, limits.max_storage_buffer_binding_size as u64);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_capacity_rejects_instance_overflow() {
        let err = TrailCapacity::check(1 << 20, 1 << 13, &wgpu::Limits::default()).unwrap_err();
        assert!(matches!(
            err,
            ViewerError::SampleCountOverflow {
                particles: 1_048_576,
                trail_length: 8192
            }
        ));
    }

    #[test]
    fn test_capacity_empty_swarm_keeps_one_row() {
        let capacity = TrailCapacity::check(0, 4, &wgpu::Limits::default()).unwrap();
        assert_eq!(capacity.instances, 0);
        assert_eq!(capacity.bytes, 4 * 16);
    }
}
