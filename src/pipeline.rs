use std::{ffi::CStr, slice, sync::Arc};

use ash::vk;

use crate::{
    device::Device,
    shader::{self, ShaderKind},
    swapchain::Swapchain,
    Result,
};

const ENTRY_POINT: &CStr = unsafe { CStr::from_bytes_with_nul_unchecked(b"main\0") };

struct ShaderModule<'a> {
    device: &'a Device,
    handle: vk::ShaderModule,
}

impl<'a> ShaderModule<'a> {
    fn new(device: &'a Device, kind: ShaderKind, source: &str) -> Result<Self> {
        let code = shader::compile_shader(kind, source)?;
        let handle = unsafe {
            device
                .handle
                .create_shader_module(&vk::ShaderModuleCreateInfo::builder().code(&code), None)?
        };
        Ok(Self { device, handle })
    }
}

impl Drop for ShaderModule<'_> {
    fn drop(&mut self) {
        unsafe { self.device.handle.destroy_shader_module(self.handle, None) };
    }
}

/// A graphics pipeline drawing a vertex-buffer-less triangle list into the swapchain format.
pub struct Pipeline {
    pub handle: vk::Pipeline,
    pub layout: vk::PipelineLayout,
    pub render_pass: vk::RenderPass,
    pub device: Arc<Device>,
}

impl Pipeline {
    pub fn new(
        device: &Arc<Device>,
        swapchain: &Swapchain,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self> {
        // Shader modules only need to outlive pipeline creation.
        let vertex_module = ShaderModule::new(device, ShaderKind::Vertex, vertex_source)?;
        let fragment_module = ShaderModule::new(device, ShaderKind::Fragment, fragment_source)?;

        // Null handles are skipped by Vulkan, so a partially built pipeline drops cleanly.
        let mut pipeline = Self {
            handle: vk::Pipeline::null(),
            layout: vk::PipelineLayout::null(),
            render_pass: vk::RenderPass::null(),
            device: device.clone(),
        };

        pipeline.render_pass = {
            let color_attachment = vk::AttachmentDescription::builder()
                .format(swapchain.surface_format.format)
                .samples(vk::SampleCountFlags::TYPE_1)
                .load_op(vk::AttachmentLoadOp::CLEAR)
                .store_op(vk::AttachmentStoreOp::STORE)
                .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                .initial_layout(vk::ImageLayout::UNDEFINED)
                .final_layout(vk::ImageLayout::PRESENT_SRC_KHR);
            let color_reference = vk::AttachmentReference::builder()
                .attachment(0)
                .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);
            let subpass = vk::SubpassDescription::builder()
                .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
                .color_attachments(slice::from_ref(&color_reference));
            unsafe {
                device.handle.create_render_pass(
                    &vk::RenderPassCreateInfo::builder()
                        .attachments(slice::from_ref(&color_attachment))
                        .subpasses(slice::from_ref(&subpass)),
                    None,
                )?
            }
        };

        pipeline.layout = unsafe {
            device
                .handle
                .create_pipeline_layout(&vk::PipelineLayoutCreateInfo::default(), None)?
        };

        let shader_stages = [
            vk::PipelineShaderStageCreateInfo::builder()
                .stage(vk::ShaderStageFlags::VERTEX)
                .module(vertex_module.handle)
                .name(ENTRY_POINT)
                .build(),
            vk::PipelineShaderStageCreateInfo::builder()
                .stage(vk::ShaderStageFlags::FRAGMENT)
                .module(fragment_module.handle)
                .name(ENTRY_POINT)
                .build(),
        ];
        let vertex_input = vk::PipelineVertexInputStateCreateInfo::default();
        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::builder()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST);
        let viewport_state = vk::PipelineViewportStateCreateInfo::builder()
            .viewport_count(1)
            .scissor_count(1);
        let rasterization = vk::PipelineRasterizationStateCreateInfo::builder()
            .polygon_mode(vk::PolygonMode::FILL)
            .cull_mode(vk::CullModeFlags::BACK)
            .front_face(vk::FrontFace::CLOCKWISE)
            .line_width(1.0);
        let multisample = vk::PipelineMultisampleStateCreateInfo::builder()
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);
        let blend_attachment = vk::PipelineColorBlendAttachmentState::builder()
            .color_write_mask(vk::ColorComponentFlags::RGBA);
        let blend = vk::PipelineColorBlendStateCreateInfo::builder()
            .attachments(slice::from_ref(&blend_attachment));
        let dynamic_state = vk::PipelineDynamicStateCreateInfo::builder()
            .dynamic_states(&[vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR]);

        let create_info = vk::GraphicsPipelineCreateInfo::builder()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization)
            .multisample_state(&multisample)
            .color_blend_state(&blend)
            .dynamic_state(&dynamic_state)
            .layout(pipeline.layout)
            .render_pass(pipeline.render_pass)
            .subpass(0)
            .build();
        let pipelines = unsafe {
            device
                .handle
                .create_graphics_pipelines(
                    vk::PipelineCache::null(),
                    slice::from_ref(&create_info),
                    None,
                )
                .map_err(|(_, result)| result)?
        };
        pipeline.handle = pipelines[0];

        log::info!("Created graphics pipeline");
        Ok(pipeline)
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        unsafe {
            self.device.handle.destroy_pipeline(self.handle, None);
            self.device
                .handle
                .destroy_pipeline_layout(self.layout, None);
            self.device
                .handle
                .destroy_render_pass(self.render_pass, None);
        }
    }
}
