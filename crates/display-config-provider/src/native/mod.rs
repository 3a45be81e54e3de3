//! The ADL2 binding, loaded from the vendor's DLL at runtime.

mod functions;

use alloc::sync::Arc;
use core::{ffi::c_void, ptr::null_mut};

use thiserror::Error;
use tracing::{debug, error, info, instrument};
use windows::Win32::{
    Foundation::{FreeLibrary, HMODULE},
    System::{Com::CoTaskMemAlloc, LibraryLoader::LoadLibraryW},
};
use windows_core::HSTRING;

pub use functions::{AdlContext, Adl2Functions};

use crate::{
    backend::{DisplayBackend, DisplayMapBuffers, HdrState, SlsMapBuffers, SlsValidity},
    config::LibraryConfig,
    ffi::{
        AdlAdapterInfo, AdlDdcInfo2, AdlDisplayId, AdlDisplayTarget, AdlSlsMap, AdlSlsTarget,
        constants::{
            ADL_DISPLAY_DISPLAYMAP_OPTION_GPUINFO,
            ADL_DISPLAY_SLSMAPCONFIG_CREATE_OPTION_RELATIVETO_CURRENTANGLE,
            ADL_DISPLAY_SLSMAPCONFIG_GET_OPTION_RELATIVETO_CURRENTANGLE,
            ADL_ENUM_CONNECTED_ADAPTERS, ADL_INVALID_SLS_MAP_INDEX, ADL_SLS_MAP_STATE_DISABLED,
            ADL_SLS_MAP_STATE_ENABLED,
        },
    },
    library::DisplayLibrary,
    memory::{CoTaskAllocator, NativeAllocator, NativeRecord, NativeView},
    result::{AdlError, AdlResult, AdlStatus},
};

/// Error variants for loading the ADL2 library.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error("None of the vendor libraries ({names}) could be loaded:\n{source}")]
    NotFound {
        names: String,
        #[source]
        source: AdlError,
    },

    #[error("The vendor library has no entry point {0}")]
    MissingEntryPoint(&'static str),

    #[error("Failed to create the ADL2 context:\n{0}")]
    Context(#[source] AdlError),
}

/// Allocation callback handed to the library, buffers it returns are freed by [`CoTaskAllocator`].
unsafe extern "system" fn adl_malloc(size: i32) -> *mut c_void {
    let Ok(size) = usize::try_from(size) else {
        return null_mut();
    };

    unsafe { CoTaskMemAlloc(size) }
}

fn free_library(module: HMODULE) {
    if let Err(e) = unsafe { FreeLibrary(module) } {
        error!("Failed to unload the vendor library:\n{e}");
    }
}

fn count_of(len: usize, call: &'static str) -> AdlResult<i32> {
    i32::try_from(len).map_err(|_| AdlError::unexpected("record count exceeds i32", call))
}

/// A loaded ADL2 library and its context.
pub struct Adl2Backend {
    functions: Adl2Functions,
    context: AdlContext,
    module: HMODULE,
    allocator: Arc<dyn NativeAllocator>,
}

// The context is only used under the facade's lock.
unsafe impl Send for Adl2Backend {}

impl Adl2Backend {
    /// Loads the first library that can be found and creates a context.
    #[instrument(skip_all, err)]
    pub fn load(config: &LibraryConfig) -> Result<Self, LoadError> {
        let mut last_error =
            AdlError::unexpected("no library names are configured", "LoadLibraryW");
        let module = config
            .library_names
            .iter()
            .find_map(|name| match unsafe { LoadLibraryW(&HSTRING::from(name.as_str())) } {
                Ok(module) => {
                    debug!("Loaded {name}");
                    Some(module)
                }
                Err(e) => {
                    debug!("Failed to load {name}: {e}");
                    last_error = AdlError::from_windows(e, "LoadLibraryW");
                    None
                }
            });

        let Some(module) = module else {
            return Err(LoadError::NotFound {
                names: config.library_names.join(", "),
                source: last_error,
            });
        };

        let functions = match unsafe { Adl2Functions::load(module) } {
            Ok(functions) => functions,
            Err(e) => {
                free_library(module);
                return Err(e);
            }
        };

        let enumerate = if config.connected_adapters_only {
            ADL_ENUM_CONNECTED_ADAPTERS
        } else {
            0
        };

        let mut context = null_mut();
        let status =
            AdlStatus(unsafe { (functions.main_control_create)(adl_malloc, enumerate, &mut context) });
        if let Err(e) = status.check("ADL2_Main_Control_Create") {
            free_library(module);
            return Err(LoadError::Context(e));
        }

        info!("Created ADL2 context");

        Ok(Self {
            functions,
            context,
            module,
            allocator: Arc::new(CoTaskAllocator),
        })
    }

    /// Takes ownership of a buffer the library allocated.
    fn owned<T: NativeRecord>(&self, address: *mut T, count: i32) -> NativeView {
        let len = usize::try_from(count).unwrap_or(0);

        // The library allocates through `adl_malloc` and the count comes from the same call.
        unsafe {
            NativeView::from_raw(
                Arc::clone(&self.allocator),
                address.cast(),
                T::KIND.layout(),
                len,
            )
        }
    }

    fn outbound<T: NativeRecord>(&self, records: &[T], call: &'static str) -> AdlResult<NativeView> {
        NativeView::from_records(&self.allocator, records).map_err(|e| AdlError::from_memory(e, call))
    }
}

impl Drop for Adl2Backend {
    fn drop(&mut self) {
        let status = AdlStatus(unsafe { (self.functions.main_control_destroy)(self.context) });
        if let Err(e) = status.check("ADL2_Main_Control_Destroy") {
            error!("Failed to destroy the ADL2 context:\n{e}");
        }

        free_library(self.module);
    }
}

impl DisplayBackend for Adl2Backend {
    fn adapter_infos(&self) -> AdlResult<NativeView> {
        const CALL: &str = "ADL2_Adapter_AdapterInfo_Get";

        let mut count = 0;
        AdlStatus(unsafe { (self.functions.number_of_adapters_get)(self.context, &mut count) })
            .check("ADL2_Adapter_NumberOfAdapters_Get")?;

        let records = vec![AdlAdapterInfo::default(); usize::try_from(count).unwrap_or(0)];
        let mut view = self.outbound(&records, CALL)?;
        if view.is_null() {
            return Ok(view);
        }

        let size = count_of(view.len() * view.layout().size, CALL)?;
        AdlStatus(unsafe {
            (self.functions.adapter_info_get)(self.context, view.as_mut_ptr().cast(), size)
        })
        .check(CALL)?;

        Ok(view)
    }

    fn adapter_active(&self, adapter_index: i32) -> AdlResult<bool> {
        let mut status = 0;
        AdlStatus(unsafe {
            (self.functions.adapter_active_get)(self.context, adapter_index, &mut status)
        })
        .check("ADL2_Adapter_Active_Get")?;

        Ok(status != 0)
    }

    fn primary_adapter(&self) -> AdlResult<i32> {
        let mut index = 0;
        AdlStatus(unsafe { (self.functions.adapter_primary_get)(self.context, &mut index) })
            .check("ADL2_Adapter_Primary_Get")?;

        Ok(index)
    }

    fn display_map_config(&self, adapter_index: i32) -> AdlResult<DisplayMapBuffers> {
        let (mut num_maps, mut maps) = (0, null_mut());
        let (mut num_targets, mut targets) = (0, null_mut());

        let status = AdlStatus(unsafe {
            (self.functions.display_map_config_get)(
                self.context,
                adapter_index,
                &mut num_maps,
                &mut maps,
                &mut num_targets,
                &mut targets,
                ADL_DISPLAY_DISPLAYMAP_OPTION_GPUINFO,
            )
        });

        let buffers = DisplayMapBuffers {
            maps: self.owned(maps, num_maps),
            targets: self.owned(targets, num_targets),
        };
        status.check("ADL2_Display_DisplayMapConfig_Get")?;

        Ok(buffers)
    }

    fn display_infos(&self, adapter_index: i32) -> AdlResult<NativeView> {
        let (mut count, mut infos) = (0, null_mut());

        let status = AdlStatus(unsafe {
            (self.functions.display_info_get)(self.context, adapter_index, &mut count, &mut infos, 0)
        });

        let view = self.owned(infos, count);
        status.check("ADL2_Display_DisplayInfo_Get")?;

        Ok(view)
    }

    fn ddc_info(&self, adapter_index: i32, display_index: i32) -> AdlResult<AdlDdcInfo2> {
        let mut info = AdlDdcInfo2::default();
        AdlStatus(unsafe {
            (self.functions.ddc_info2_get)(self.context, adapter_index, display_index, &mut info)
        })
        .check("ADL2_Display_DDCInfo2_Get")?;

        Ok(info)
    }

    fn hdr_state(&self, adapter_index: i32, display: AdlDisplayId) -> AdlResult<HdrState> {
        let (mut supported, mut enabled) = (0, 0);
        AdlStatus(unsafe {
            (self.functions.hdr_state_get)(
                self.context,
                adapter_index,
                display,
                &mut supported,
                &mut enabled,
            )
        })
        .check("ADL2_Display_HDRState_Get")?;

        Ok(HdrState {
            supported: supported != 0,
            enabled: enabled != 0,
        })
    }

    fn set_hdr_state(
        &self,
        adapter_index: i32,
        display: AdlDisplayId,
        enabled: bool,
    ) -> AdlResult<()> {
        AdlStatus(unsafe {
            (self.functions.hdr_state_set)(
                self.context,
                adapter_index,
                display,
                i32::from(enabled),
            )
        })
        .check("ADL2_Display_HDRState_Set")
    }

    fn sls_map_index(
        &self,
        adapter_index: i32,
        targets: &[AdlDisplayTarget],
    ) -> AdlResult<Option<i32>> {
        const CALL: &str = "ADL2_Display_SLSMapIndex_Get";

        let mut view = self.outbound(targets, CALL)?;
        let count = count_of(view.len(), CALL)?;

        let mut index = ADL_INVALID_SLS_MAP_INDEX;
        AdlStatus(unsafe {
            (self.functions.sls_map_index_get)(
                self.context,
                adapter_index,
                count,
                view.as_mut_ptr().cast(),
                &mut index,
            )
        })
        .check(CALL)?;

        Ok((index != ADL_INVALID_SLS_MAP_INDEX).then_some(index))
    }

    fn sls_map_config(&self, adapter_index: i32, map_index: i32) -> AdlResult<SlsMapBuffers> {
        let mut map = AdlSlsMap::default();
        let (mut num_targets, mut targets) = (0, null_mut());
        let (mut num_native, mut native) = (0, null_mut());
        let (mut num_bezel, mut bezel) = (0, null_mut());
        let (mut num_transient, mut transient) = (0, null_mut());
        let (mut num_offsets, mut offsets) = (0, null_mut());

        let status = AdlStatus(unsafe {
            (self.functions.sls_map_config_get)(
                self.context,
                adapter_index,
                map_index,
                &mut map,
                &mut num_targets,
                &mut targets,
                &mut num_native,
                &mut native,
                &mut num_bezel,
                &mut bezel,
                &mut num_transient,
                &mut transient,
                &mut num_offsets,
                &mut offsets,
                ADL_DISPLAY_SLSMAPCONFIG_GET_OPTION_RELATIVETO_CURRENTANGLE,
            )
        });

        let buffers = SlsMapBuffers {
            map,
            targets: self.owned(targets, num_targets),
            native_modes: self.owned(native, num_native),
            bezel_modes: self.owned(bezel, num_bezel),
            transient_modes: self.owned(transient, num_transient),
            offsets: self.owned(offsets, num_offsets),
        };
        status.check("ADL2_Display_SLSMapConfig_Get")?;

        Ok(buffers)
    }

    fn validate_sls_map(
        &self,
        map: &AdlSlsMap,
        targets: &[AdlSlsTarget],
    ) -> AdlResult<SlsValidity> {
        const CALL: &str = "ADL2_Display_SLSMapConfig_Valid";

        let mut view = self.outbound(targets, CALL)?;
        let count = count_of(view.len(), CALL)?;

        let mut validity = SlsValidity::default();
        AdlStatus(unsafe {
            (self.functions.sls_map_config_valid)(
                self.context,
                map.adapter_index,
                *map,
                count,
                view.as_mut_ptr().cast(),
                &mut validity.supported_layout_mode,
                &mut validity.not_supported_reason,
                0,
            )
        })
        .check(CALL)?;

        Ok(validity)
    }

    fn create_sls_map(
        &self,
        map: &AdlSlsMap,
        targets: &[AdlSlsTarget],
        bezel_percent: i32,
    ) -> AdlResult<i32> {
        const CALL: &str = "ADL2_Display_SLSMapConfig_Create";

        let mut view = self.outbound(targets, CALL)?;
        let count = count_of(view.len(), CALL)?;

        let mut index = ADL_INVALID_SLS_MAP_INDEX;
        AdlStatus(unsafe {
            (self.functions.sls_map_config_create)(
                self.context,
                map.adapter_index,
                *map,
                count,
                view.as_mut_ptr().cast(),
                bezel_percent,
                &mut index,
                ADL_DISPLAY_SLSMAPCONFIG_CREATE_OPTION_RELATIVETO_CURRENTANGLE,
            )
        })
        .check(CALL)?;

        if index == ADL_INVALID_SLS_MAP_INDEX {
            return Err(AdlError::unexpected("no map index was returned", CALL));
        }

        Ok(index)
    }

    fn set_sls_map_state(
        &self,
        adapter_index: i32,
        map_index: i32,
        enabled: bool,
    ) -> AdlResult<()> {
        let state = if enabled {
            ADL_SLS_MAP_STATE_ENABLED
        } else {
            ADL_SLS_MAP_STATE_DISABLED
        };

        AdlStatus(unsafe {
            (self.functions.sls_map_config_set_state)(self.context, adapter_index, map_index, state)
        })
        .check("ADL2_Display_SLSMapConfig_SetState")
    }

    fn display_modes(&self, adapter_index: i32, display_index: i32) -> AdlResult<NativeView> {
        let (mut count, mut modes) = (0, null_mut());

        let status = AdlStatus(unsafe {
            (self.functions.modes_get)(
                self.context,
                adapter_index,
                display_index,
                &mut count,
                &mut modes,
            )
        });

        let view = self.owned(modes, count);
        status.check("ADL2_Display_Modes_Get")?;

        Ok(view)
    }
}

impl DisplayLibrary<Adl2Backend> {
    /// Loads the ADL2 library named in `config`, unavailable if it cannot be loaded.
    pub fn load(config: &LibraryConfig) -> Self {
        Self::initialize(config, Adl2Backend::load)
    }
}
