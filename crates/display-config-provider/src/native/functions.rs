use core::ffi::c_void;

use windows::Win32::{Foundation::HMODULE, System::LibraryLoader::GetProcAddress};
use windows_core::PCSTR;

use crate::ffi::{
    AdlAdapterInfo, AdlBezelTransientMode, AdlDdcInfo2, AdlDisplayId, AdlDisplayInfo,
    AdlDisplayMap, AdlDisplayTarget, AdlMode, AdlSlsMap, AdlSlsMode, AdlSlsOffset, AdlSlsTarget,
};

use super::LoadError;

/// `ADL_CONTEXT_HANDLE`
pub type AdlContext = *mut c_void;

/// `ADL_MAIN_MALLOC_CALLBACK`
pub type AdlMallocCallback = unsafe extern "system" fn(i32) -> *mut c_void;

macro_rules! entry_points {
    ($($field:ident: $name:literal => fn($($arg:ty),* $(,)?);)*) => {
        /// ADL2 entry points resolved from the loaded library.
        pub struct Adl2Functions {
            $(
                #[doc = concat!("`", $name, "`")]
                pub $field: unsafe extern "C" fn($($arg),*) -> i32,
            )*
        }

        impl Adl2Functions {
            /// Resolves every entry point.
            ///
            /// # Safety
            /// `module` must be a loaded ADL library, the resolved pointers are only valid while
            /// it stays loaded.
            pub unsafe fn load(module: HMODULE) -> Result<Self, LoadError> {
                Ok(Self {
                    $(
                        $field: {
                            let name = PCSTR::from_raw(concat!($name, "\0").as_ptr());
                            let address = unsafe { GetProcAddress(module, name) }
                                .ok_or(LoadError::MissingEntryPoint($name))?;

                            unsafe {
                                core::mem::transmute::<
                                    unsafe extern "system" fn() -> isize,
                                    unsafe extern "C" fn($($arg),*) -> i32,
                                >(address)
                            }
                        },
                    )*
                })
            }
        }
    };
}

entry_points! {
    main_control_create: "ADL2_Main_Control_Create" =>
        fn(AdlMallocCallback, i32, *mut AdlContext);
    main_control_destroy: "ADL2_Main_Control_Destroy" => fn(AdlContext);
    number_of_adapters_get: "ADL2_Adapter_NumberOfAdapters_Get" => fn(AdlContext, *mut i32);
    adapter_info_get: "ADL2_Adapter_AdapterInfo_Get" =>
        fn(AdlContext, *mut AdlAdapterInfo, i32);
    adapter_active_get: "ADL2_Adapter_Active_Get" => fn(AdlContext, i32, *mut i32);
    adapter_primary_get: "ADL2_Adapter_Primary_Get" => fn(AdlContext, *mut i32);
    display_map_config_get: "ADL2_Display_DisplayMapConfig_Get" => fn(
        AdlContext,
        i32,
        *mut i32,
        *mut *mut AdlDisplayMap,
        *mut i32,
        *mut *mut AdlDisplayTarget,
        i32,
    );
    display_info_get: "ADL2_Display_DisplayInfo_Get" =>
        fn(AdlContext, i32, *mut i32, *mut *mut AdlDisplayInfo, i32);
    ddc_info2_get: "ADL2_Display_DDCInfo2_Get" => fn(AdlContext, i32, i32, *mut AdlDdcInfo2);
    hdr_state_get: "ADL2_Display_HDRState_Get" =>
        fn(AdlContext, i32, AdlDisplayId, *mut i32, *mut i32);
    hdr_state_set: "ADL2_Display_HDRState_Set" => fn(AdlContext, i32, AdlDisplayId, i32);
    sls_map_index_get: "ADL2_Display_SLSMapIndex_Get" =>
        fn(AdlContext, i32, i32, *mut AdlDisplayTarget, *mut i32);
    sls_map_config_get: "ADL2_Display_SLSMapConfig_Get" => fn(
        AdlContext,
        i32,
        i32,
        *mut AdlSlsMap,
        *mut i32,
        *mut *mut AdlSlsTarget,
        *mut i32,
        *mut *mut AdlSlsMode,
        *mut i32,
        *mut *mut AdlBezelTransientMode,
        *mut i32,
        *mut *mut AdlBezelTransientMode,
        *mut i32,
        *mut *mut AdlSlsOffset,
        i32,
    );
    sls_map_config_create: "ADL2_Display_SLSMapConfig_Create" => fn(
        AdlContext,
        i32,
        AdlSlsMap,
        i32,
        *mut AdlSlsTarget,
        i32,
        *mut i32,
        i32,
    );
    sls_map_config_valid: "ADL2_Display_SLSMapConfig_Valid" => fn(
        AdlContext,
        i32,
        AdlSlsMap,
        i32,
        *mut AdlSlsTarget,
        *mut i32,
        *mut i32,
        i32,
    );
    sls_map_config_set_state: "ADL2_Display_SLSMapConfig_SetState" =>
        fn(AdlContext, i32, i32, i32);
    modes_get: "ADL2_Display_Modes_Get" => fn(AdlContext, i32, i32, *mut i32, *mut *mut AdlMode);
}
