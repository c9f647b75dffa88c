use anyhow::Result;
use ash::vk;

use crate::command_buffer::{CommandBuffer, IncompleteCommandBuffer};
use crate::{BufferView, Device, Error};

impl IncompleteCommandBuffer {
    /// Begin recording into a freshly allocated command buffer.
    pub fn new(device: Device, handle: vk::CommandBuffer, flags: vk::CommandBufferUsageFlags) -> Result<Self> {
        let begin_info = vk::CommandBufferBeginInfo {
            flags,
            ..Default::default()
        };
        unsafe { device.begin_command_buffer(handle, &begin_info)? };
        Ok(IncompleteCommandBuffer {
            device,
            handle,
        })
    }

    /// Finish recording a command buffer and move its contents into a finished
    /// command buffer that can be submitted
    pub fn finish(self) -> Result<CommandBuffer> {
        unsafe { self.device.end_command_buffer(self.handle)? }
        Ok(CommandBuffer {
            handle: self.handle,
        })
    }

    /// The device this command buffer records for. Together with [`IncompleteCommandBuffer::handle`] this
    /// allows recording any command through ash directly.
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Get unsafe access to the underlying command buffer
    /// # Safety
    /// The caller must not end, reset or free the command buffer.
    pub unsafe fn handle(&self) -> vk::CommandBuffer {
        self.handle
    }

    /// vkCmdPipelineBarrier with a single image memory barrier.
    pub fn image_barrier(&self, src_stage: vk::PipelineStageFlags, dst_stage: vk::PipelineStageFlags, barrier: &vk::ImageMemoryBarrier) -> &Self {
        unsafe {
            self.device.cmd_pipeline_barrier(
                self.handle,
                src_stage,
                dst_stage,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                std::slice::from_ref(barrier),
            );
        }
        self
    }

    /// vkCmdPipelineBarrier with a single buffer memory barrier over the viewed range.
    pub fn buffer_barrier(
        &self,
        buffer: &BufferView,
        src_stage: vk::PipelineStageFlags,
        src_access: vk::AccessFlags,
        dst_stage: vk::PipelineStageFlags,
        dst_access: vk::AccessFlags,
    ) -> &Self {
        let barrier = vk::BufferMemoryBarrier {
            src_access_mask: src_access,
            dst_access_mask: dst_access,
            src_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
            dst_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
            buffer: buffer.handle,
            offset: buffer.offset,
            size: buffer.size,
            ..Default::default()
        };
        unsafe {
            self.device.cmd_pipeline_barrier(
                self.handle,
                src_stage,
                dst_stage,
                vk::DependencyFlags::empty(),
                &[],
                std::slice::from_ref(&barrier),
                &[],
            );
        }
        self
    }

    /// Transition the first mip level and layer of an image between layouts.
    /// This is a full barrier, meant for simple task bodies rather than tightly scheduled passes.
    pub fn transition_image(&self, image: vk::Image, aspect: vk::ImageAspectFlags, from: vk::ImageLayout, to: vk::ImageLayout) -> &Self {
        let barrier = vk::ImageMemoryBarrier {
            src_access_mask: vk::AccessFlags::MEMORY_WRITE,
            dst_access_mask: vk::AccessFlags::MEMORY_READ | vk::AccessFlags::MEMORY_WRITE,
            old_layout: from,
            new_layout: to,
            src_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
            dst_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
            image,
            subresource_range: vk::ImageSubresourceRange {
                aspect_mask: aspect,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            },
            ..Default::default()
        };
        self.image_barrier(vk::PipelineStageFlags::ALL_COMMANDS, vk::PipelineStageFlags::ALL_COMMANDS, &barrier)
    }

    /// Clear the first mip level and layer of a color image. The image must be in `GENERAL` or `TRANSFER_DST_OPTIMAL` layout.
    pub fn clear_color_image(&self, image: vk::Image, layout: vk::ImageLayout, color: [f32; 4]) -> &Self {
        let value = vk::ClearColorValue {
            float32: color,
        };
        let range = vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        };
        unsafe {
            self.device
                .cmd_clear_color_image(self.handle, image, layout, &value, std::slice::from_ref(&range));
        }
        self
    }

    /// Fill the viewed range of a buffer with a repeated 32-bit value.
    pub fn fill_buffer(&self, buffer: &BufferView, data: u32) -> &Self {
        unsafe {
            self.device
                .cmd_fill_buffer(self.handle, buffer.handle, buffer.offset, buffer.size, data);
        }
        self
    }

    /// Copy one buffer to the other.
    /// # Errors
    /// Fails if the buffer views do not have the same size.
    pub fn copy_buffer(&self, src: &BufferView, dst: &BufferView) -> Result<&Self> {
        if src.size != dst.size {
            return Err(Error::InvalidBufferCopy.into());
        }

        let copy = vk::BufferCopy {
            src_offset: src.offset,
            dst_offset: dst.offset,
            size: src.size,
        };

        unsafe {
            self.device
                .cmd_copy_buffer(self.handle, src.handle, dst.handle, std::slice::from_ref(&copy));
        }

        Ok(self)
    }

    /// Copy the first mip level and layer of an image into a tightly packed buffer range.
    pub fn copy_image_to_buffer(
        &self,
        image: vk::Image,
        layout: vk::ImageLayout,
        aspect: vk::ImageAspectFlags,
        extent: vk::Extent3D,
        dst: &BufferView,
    ) -> &Self {
        let copy = vk::BufferImageCopy {
            buffer_offset: dst.offset,
            buffer_row_length: 0,
            buffer_image_height: 0,
            image_subresource: vk::ImageSubresourceLayers {
                aspect_mask: aspect,
                mip_level: 0,
                base_array_layer: 0,
                layer_count: 1,
            },
            image_offset: Default::default(),
            image_extent: extent,
        };
        unsafe {
            self.device
                .cmd_copy_image_to_buffer(self.handle, image, layout, dst.handle, std::slice::from_ref(&copy));
        }
        self
    }
}
